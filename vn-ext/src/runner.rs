//! # Runner 模块
//!
//! 按顺序执行解析后的脚本。
//!
//! ## 执行模型
//!
//! ```text
//! step(token) -> StepReport
//! ```
//!
//! 1. 取出当前位置的指令
//! 2. `@print` 交给 [`PrintText::execute`]，任务指令交给注入的 [`QuestLogManager`]
//! 3. 前进到下一条指令
//!
//! 每条指令使用独立的 [`AsyncToken`]：完成令牌只跳过当前文本的显示，
//! 取消令牌中止当前指令。

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::ScriptCommand;
use crate::error::{ExtResult, PrintError};
use crate::printer::{PrintOutcome, PrintServices};
use crate::quest::QuestLogManager;
use crate::save::{GameStateMap, keys};
use crate::script::Script;
use crate::state::PlaybackSpot;
use crate::token::AsyncToken;

/// 脚本执行位置（存档用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPosition {
    pub script_name: String,
    /// 下一条要执行的指令序号
    pub index: usize,
}

/// 单步执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub spot: PlaybackSpot,
    /// 指令名
    pub command: &'static str,
    /// `@print` 的执行结果
    pub print: Option<PrintOutcome>,
}

/// 整体执行结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// 执行的指令数
    pub executed: usize,
    /// 是否被中止
    pub stopped: bool,
}

/// 脚本执行器
pub struct ScriptRunner {
    script: Script,
    index: usize,
    services: PrintServices,
    quests: QuestLogManager,
}

impl ScriptRunner {
    pub fn new(script: Script, services: PrintServices, quests: QuestLogManager) -> Self {
        Self {
            script,
            index: 0,
            services,
            quests,
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn services(&self) -> &PrintServices {
        &self.services
    }

    pub fn quests(&self) -> &QuestLogManager {
        &self.quests
    }

    /// 用于注册界面订阅者
    pub fn quests_mut(&mut self) -> &mut QuestLogManager {
        &mut self.quests
    }

    pub fn position(&self) -> ScriptPosition {
        ScriptPosition {
            script_name: self.script.name.clone(),
            index: self.index,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.script.len()
    }

    /// 新游戏：回到开头并清空任务
    pub fn reset(&mut self) {
        self.index = 0;
        self.quests.reset();
    }

    /// 执行下一条指令；脚本结束时返回 `Ok(None)`
    pub async fn step(&mut self, token: AsyncToken) -> Result<Option<StepReport>, PrintError> {
        let Some(line) = self.script.get(self.index).cloned() else {
            return Ok(None);
        };
        self.index += 1;
        let command_name = line.command.name();
        debug!(spot = %line.spot, command = command_name, "执行指令");

        let mut print = None;
        match line.command {
            ScriptCommand::Print(mut command) => {
                print = Some(command.execute(&self.services, token).await?);
            }
            ScriptCommand::AddQuest { id, title } => {
                self.quests.start_quest(&id, &title);
            }
            ScriptCommand::AddQuestUpdate { id, text } => {
                if !self.quests.update_quest(&id, &text) {
                    warn!(spot = %line.spot, quest = %id, "任务不存在，进展被忽略");
                }
            }
            ScriptCommand::CompleteQuest { id } => {
                if !self.quests.complete_quest(&id) {
                    warn!(spot = %line.spot, quest = %id, "任务不存在，无法完成");
                }
            }
            ScriptCommand::AddQuestMessage { text } => {
                self.quests.add_message(text);
            }
        }

        Ok(Some(StepReport {
            spot: line.spot,
            command: command_name,
            print,
        }))
    }

    /// 执行到脚本结束，或 `stop` 被取消
    ///
    /// `stop` 被取消时，正在执行的指令会收到取消信号并尽快返回。
    pub async fn run(&mut self, stop: &AsyncToken) -> Result<RunSummary, PrintError> {
        let mut summary = RunSummary::default();

        while !self.is_finished() {
            if stop.is_canceled() {
                summary.stopped = true;
                break;
            }

            let token = AsyncToken::new();
            let step = self.step(token.clone());
            tokio::pin!(step);
            let report = tokio::select! {
                result = &mut step => result?,
                _ = stop.canceled() => {
                    token.cancel();
                    summary.stopped = true;
                    step.await?
                }
            };

            if report.is_some() {
                summary.executed += 1;
            }
            if summary.stopped {
                break;
            }
        }

        info!(
            executed = summary.executed,
            stopped = summary.stopped,
            "脚本执行结束"
        );
        Ok(summary)
    }

    /// 写入执行位置与任务状态
    pub fn save_state(&self, map: &mut GameStateMap) -> ExtResult<()> {
        map.set_state(keys::SCRIPT_POSITION, &self.position())?;
        map.set_state(keys::QUEST_LOG, &self.quests.snapshot())?;
        Ok(())
    }

    /// 恢复执行位置与任务状态
    ///
    /// 存档属于其他脚本时只恢复任务状态。
    pub fn restore_state(&mut self, map: &GameStateMap) -> ExtResult<()> {
        if let Some(position) = map.get_state::<ScriptPosition>(keys::SCRIPT_POSITION)? {
            if position.script_name == self.script.name {
                self.index = position.index.min(self.script.len());
            } else {
                warn!(
                    saved = %position.script_name,
                    current = %self.script.name,
                    "存档属于其他脚本，忽略执行位置"
                );
            }
        }
        if let Some(state) = map.get_state(keys::QUEST_LOG)? {
            self.quests.restore(state);
        }
        Ok(())
    }
}
