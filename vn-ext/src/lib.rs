//! # VN Ext
//!
//! 视觉小说引擎的玩法/界面扩展：文本打印指令与任务日志。
//!
//! ## 架构概述
//!
//! `vn-ext` 是纯逻辑核心。引擎侧的能力（打印机、音频、本地化、脚本播放器、回看界面）
//! 都以 trait 的形式注入：
//!
//! ```text
//! 脚本文本 ──Parser──► Script ──ScriptRunner──► PrintText::execute ──► PrinterManager / AudioManager / BacklogUi
//!                                     │
//!                                     └──► QuestLogManager ──事件──► QuestLogPanel / ScrollLog / NotificationMark
//! ```
//!
//! 所有挂起点（显隐过渡、语音、逐字显示、等待输入）都观察同一个 [`AsyncToken`]：
//! 取消时尽快返回，完成时表示玩家跳过了显示。
//!
//! ## 使用示例
//!
//! ```ignore
//! let script = Parser::new().parse("chapter1", &text)?;
//! let mut runner = ScriptRunner::new(script, services, QuestLogManager::new());
//! QuestLogPanel::attach(&panel, runner.quests_mut());
//! runner.run(&AsyncToken::new()).await?;
//! ```
//!
//! ## 模块结构
//!
//! - [`command`]：脚本指令
//! - [`script`]：脚本解析
//! - [`printer`]：`@print` 指令的执行流程与打印机接口
//! - [`quest`]：任务状态、事件与界面
//! - [`runner`]：脚本执行器
//! - [`save`]：游戏状态容器
//! - [`memory`]：协作者接口的内存实现

pub mod audio;
pub mod backlog;
pub mod command;
pub mod config;
pub mod error;
pub mod memory;
pub mod player;
pub mod printer;
pub mod quest;
pub mod runner;
pub mod save;
pub mod script;
pub mod state;
pub mod text;
pub mod token;

// 重导出核心类型
pub use audio::AudioManager;
pub use backlog::{BacklogMessage, BacklogUi};
pub use command::ScriptCommand;
pub use config::{
    AudioConfig, AutoVoiceMode, ExtConfig, PrinterMetadata, PrintersConfig, QuestLogConfig,
    VoiceOverlapPolicy,
};
pub use error::{
    ActorError, AudioError, ConfigError, ExtError, ExtResult, ParseError, PrintError, SaveError,
};
pub use player::{RollbackStack, ScriptPlayer};
pub use printer::{
    CharacterManager, PrintOutcome, PrintServices, PrintText, PrinterActor, PrinterManager,
};
pub use quest::{
    NotificationMark, Quest, QuestEvent, QuestLogManager, QuestLogMessage, QuestLogPanel,
    QuestLogState, ScrollLog,
};
pub use runner::{RunSummary, ScriptPosition, ScriptRunner, StepReport};
pub use save::{GameStateMap, SaveVersion};
pub use script::{Parser, Script, ScriptLine};
pub use state::PlaybackSpot;
pub use text::{LocalizableText, SourceLocalizer, TextLocalizer};
pub use token::{AsyncToken, TokenState};
