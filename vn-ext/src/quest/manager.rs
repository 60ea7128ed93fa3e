//! # QuestLogManager
//!
//! 任务状态与任务事件。
//!
//! ## 任务状态
//!
//! ```text
//! (不存在) ──start──► 进行中 ──update──► 进行中 ──complete──► 已完成（移出）
//! ```
//!
//! 事件在调用方的调用栈内同步分发，顺序与操作顺序一致。
//! 订阅者通过 [`QuestLogManager::subscribe`] 显式注册，通过返回的 ID 注销。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::quest::model::Quest;
use crate::text::LocalizableText;

/// 任务事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestEvent<'a> {
    /// 任务开始或有新进展
    Updated(&'a Quest),
    /// 任务完成（已从进行中移除）
    Completed(&'a str),
    /// 有新的任务提示（驱动提示角标）
    Notification,
    /// 普通任务日志消息
    Message(&'a LocalizableText),
}

/// 订阅 ID
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&QuestEvent<'_>) + Send>;

/// 可序列化的任务状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestLogState {
    /// 进行中的任务（按 ID 排序）
    pub active_quests: Vec<Quest>,
}

/// 任务管理器
///
/// 由宿主显式构造并注入给脚本指令与界面，不存在全局实例。
#[derive(Default)]
pub struct QuestLogManager {
    active: BTreeMap<String, Quest>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl fmt::Debug for QuestLogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestLogManager")
            .field("active", &self.active)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl QuestLogManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册事件订阅者
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&QuestEvent<'_>) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// 注销订阅者，返回是否存在
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// 是否有进行中的任务
    pub fn has_active_quest(&self, quest_id: &str) -> bool {
        self.active.contains_key(quest_id)
    }

    /// 获取进行中的任务
    pub fn get_quest(&self, quest_id: &str) -> Option<&Quest> {
        self.active.get(quest_id)
    }

    /// 所有进行中的任务（按 ID 排序）
    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.active.values()
    }

    /// 开始任务
    ///
    /// ID 已存在时覆盖原任务。
    pub fn start_quest(&mut self, quest_id: &str, title: &str) {
        debug!(quest = %quest_id, title = %title, "开始任务");
        let Self {
            active, listeners, ..
        } = self;

        active.insert(quest_id.to_string(), Quest::new(quest_id, title));
        if let Some(quest) = active.get(quest_id) {
            emit(listeners, &QuestEvent::Updated(quest));
        }
    }

    /// 追加任务进展
    ///
    /// 任务不存在时不做任何事，返回 false。
    pub fn update_quest(&mut self, quest_id: &str, text: &str) -> bool {
        let Self {
            active, listeners, ..
        } = self;

        let Some(quest) = active.get_mut(quest_id) else {
            debug!(quest = %quest_id, "任务不存在，忽略进展");
            return false;
        };

        quest.add_update(text);
        debug!(quest = %quest_id, updates = quest.updates.len(), "任务进展");
        emit(listeners, &QuestEvent::Updated(&*quest));
        emit(listeners, &QuestEvent::Notification);
        true
    }

    /// 完成任务
    ///
    /// 任务不存在时不做任何事，返回 false。
    pub fn complete_quest(&mut self, quest_id: &str) -> bool {
        let Some(mut quest) = self.active.remove(quest_id) else {
            debug!(quest = %quest_id, "任务不存在，忽略完成");
            return false;
        };

        quest.complete();
        debug!(quest = %quest_id, "完成任务");
        emit(&mut self.listeners, &QuestEvent::Completed(&quest.id));
        emit(&mut self.listeners, &QuestEvent::Notification);
        true
    }

    /// 添加一条普通任务日志消息
    pub fn add_message(&mut self, text: LocalizableText) {
        if text.is_empty() {
            return;
        }
        emit(&mut self.listeners, &QuestEvent::Message(&text));
    }

    /// 清空所有任务（新游戏），不发出事件
    pub fn reset(&mut self) {
        self.active.clear();
    }

    /// 导出状态（存档）
    pub fn snapshot(&self) -> QuestLogState {
        QuestLogState {
            active_quests: self.active.values().cloned().collect(),
        }
    }

    /// 恢复状态（读档），不发出事件
    pub fn restore(&mut self, state: QuestLogState) {
        self.active = state
            .active_quests
            .into_iter()
            .filter(|quest| !quest.completed)
            .map(|quest| (quest.id.clone(), quest))
            .collect();
    }
}

fn emit(listeners: &mut [(SubscriptionId, Listener)], event: &QuestEvent<'_>) {
    for (_, listener) in listeners.iter_mut() {
        listener(event);
    }
}
