//! # ScrollLog
//!
//! 有容量上限的滚动消息日志。超过容量时回收最旧的条目；存档只保留最近的若干条。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::QuestLogConfig;
use crate::quest::manager::{QuestEvent, QuestLogManager, SubscriptionId};
use crate::quest::message::{MessageWidget, QuestLogMessage};
use crate::text::LocalizableText;

/// 滚动日志存档状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollLogState {
    pub messages: Vec<QuestLogMessage>,
}

/// 滚动消息日志
#[derive(Debug)]
pub struct ScrollLog {
    messages: VecDeque<MessageWidget>,
    capacity: usize,
    save_capacity: usize,
    pool: Vec<MessageWidget>,
    created: usize,
    recycled: usize,
}

impl ScrollLog {
    pub fn new(capacity: usize, save_capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity: capacity.max(1),
            save_capacity,
            pool: Vec::new(),
            created: 0,
            recycled: 0,
        }
    }

    pub fn from_config(config: &QuestLogConfig) -> Self {
        Self::new(config.capacity, config.save_capacity)
    }

    /// 把共享日志注册为任务事件订阅者（只响应普通消息）
    pub fn attach(log: &Arc<Mutex<Self>>, manager: &mut QuestLogManager) -> SubscriptionId {
        let weak: Weak<Mutex<Self>> = Arc::downgrade(log);
        manager.subscribe(move |event| {
            if let Some(log) = weak.upgrade() {
                log.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .handle_event(event);
            }
        })
    }

    pub fn handle_event(&mut self, event: &QuestEvent<'_>) {
        if let QuestEvent::Message(text) = event {
            self.add_message((*text).clone());
        }
    }

    /// 添加消息；达到容量时最旧的条目被回收复用
    pub fn add_message(&mut self, text: LocalizableText) {
        let mut widget = if self.messages.len() >= self.capacity {
            self.recycled += 1;
            trace!(capacity = self.capacity, "回收最旧的日志条目");
            self.messages.pop_front()
        } else {
            self.pool.pop()
        }
        .unwrap_or_else(|| {
            self.created += 1;
            MessageWidget::default()
        });

        widget.initialize(QuestLogMessage::new(text));
        self.messages.push_back(widget);
    }

    /// 追加到最新一条消息
    pub fn append_message(&mut self, text: LocalizableText) {
        if let Some(last) = self.messages.back_mut() {
            last.append(text);
        }
    }

    /// 清空，条目回到对象池
    pub fn clear(&mut self) {
        for mut widget in self.messages.drain(..) {
            widget.deactivate();
            self.pool.push(widget);
        }
    }

    /// 从旧到新的消息
    pub fn messages(&self) -> impl Iterator<Item = &MessageWidget> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    /// 因超出容量被回收的次数
    pub fn recycled_count(&self) -> usize {
        self.recycled
    }

    /// 导出状态，只保留最近 `save_capacity` 条
    pub fn get_state(&self) -> ScrollLogState {
        let skip = self.messages.len().saturating_sub(self.save_capacity);
        ScrollLogState {
            messages: self
                .messages
                .iter()
                .skip(skip)
                .map(MessageWidget::get_state)
                .collect(),
        }
    }

    pub fn set_state(&mut self, state: ScrollLogState) {
        self.clear();
        for message in state.messages {
            self.add_message(message.text().clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(log: &ScrollLog) -> Vec<String> {
        log.messages().map(|m| m.text().to_string()).collect()
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = ScrollLog::new(3, 2);
        for i in 0..5 {
            log.add_message(LocalizableText::plain(format!("m{i}")));
        }

        assert_eq!(texts(&log), vec!["m2", "m3", "m4"]);
        assert_eq!(log.created_count(), 3);
        assert_eq!(log.recycled_count(), 2);
    }

    #[test]
    fn test_save_keeps_latest() {
        let mut log = ScrollLog::new(10, 2);
        for i in 0..4 {
            log.add_message(LocalizableText::plain(format!("m{i}")));
        }

        let state = log.get_state();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].text().to_string(), "m2");

        let mut restored = ScrollLog::new(10, 2);
        restored.set_state(state);
        assert_eq!(texts(&restored), vec!["m2", "m3"]);
    }

    #[test]
    fn test_append_and_clear_reuse_pool() {
        let mut log = ScrollLog::new(5, 5);
        log.append_message(LocalizableText::plain("ignored"));
        assert!(log.is_empty());

        log.add_message(LocalizableText::plain("获得"));
        log.append_message(LocalizableText::plain("：钥匙"));
        assert_eq!(texts(&log), vec!["获得：钥匙"]);

        log.clear();
        log.add_message(LocalizableText::plain("again"));
        assert_eq!(log.created_count(), 1);
    }

    #[test]
    fn test_attach_only_takes_messages() {
        let log = Arc::new(Mutex::new(ScrollLog::from_config(&QuestLogConfig::default())));
        let mut manager = QuestLogManager::new();
        ScrollLog::attach(&log, &mut manager);

        manager.start_quest("q1", "T");
        manager.add_message(LocalizableText::plain("note"));

        assert_eq!(texts(&log.lock().unwrap()), vec!["note"]);
    }
}
