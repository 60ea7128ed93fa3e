//! # NotificationMark
//!
//! 任务提示角标：收到任务提示时显示，玩家打开任务日志后隐藏。

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::quest::manager::{QuestEvent, QuestLogManager, SubscriptionId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotificationMark {
    visible: bool,
}

impl NotificationMark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(mark: &Arc<Mutex<Self>>, manager: &mut QuestLogManager) -> SubscriptionId {
        let weak: Weak<Mutex<Self>> = Arc::downgrade(mark);
        manager.subscribe(move |event| {
            if let Some(mark) = weak.upgrade() {
                mark.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .handle_event(event);
            }
        })
    }

    pub fn handle_event(&mut self, event: &QuestEvent<'_>) {
        if matches!(event, QuestEvent::Notification) {
            self.show_mark();
        }
    }

    /// 显示角标（重复调用无副作用）
    pub fn show_mark(&mut self) {
        self.visible = true;
    }

    pub fn hide_mark(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
