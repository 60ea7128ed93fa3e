//! # QuestLogPanel
//!
//! 任务日志面板：每个任务一个条目，每条进展一个子行。
//!
//! 条目按插入顺序排列；被清除的条目回收到对象池，下次创建条目时优先复用。
//!
//! 注意：任务完成时面板会清空**全部**条目，而不只是完成的那个任务。
//! 这是现有行为，修改前需要确认界面需求。

use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::quest::manager::{QuestEvent, QuestLogManager, SubscriptionId};
use crate::quest::message::{MessageWidget, QuestLogMessage};
use crate::quest::model::Quest;
use crate::text::LocalizableText;

#[derive(Debug)]
struct PanelEntry {
    /// 任务 ID；普通消息没有 ID
    quest_id: Option<String>,
    widget: MessageWidget,
}

/// 面板条目的存档状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelEntryState {
    pub quest_id: Option<String>,
    pub message: QuestLogMessage,
    #[serde(default)]
    pub lines: Vec<QuestLogMessage>,
}

/// 面板存档状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestLogPanelState {
    pub entries: Vec<PanelEntryState>,
}

/// 任务日志面板
#[derive(Debug, Default)]
pub struct QuestLogPanel {
    entries: Vec<PanelEntry>,
    pool: Vec<MessageWidget>,
    created: usize,
    visible: bool,
}

impl QuestLogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把共享面板注册为任务事件订阅者
    ///
    /// 管理器只持有弱引用；面板释放后事件被忽略。需要提前解绑时调用
    /// [`QuestLogManager::unsubscribe`]。
    pub fn attach(panel: &Arc<Mutex<Self>>, manager: &mut QuestLogManager) -> SubscriptionId {
        let weak: Weak<Mutex<Self>> = Arc::downgrade(panel);
        manager.subscribe(move |event| {
            if let Some(panel) = weak.upgrade() {
                panel
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .handle_event(event);
            }
        })
    }

    /// 处理任务事件
    pub fn handle_event(&mut self, event: &QuestEvent<'_>) {
        match event {
            QuestEvent::Updated(quest) => self.on_quest_updated(quest),
            QuestEvent::Completed(quest_id) => self.on_quest_completed(quest_id),
            QuestEvent::Message(text) => self.add_message((*text).clone()),
            QuestEvent::Notification => {}
        }
    }

    /// 任务开始或有进展
    pub fn on_quest_updated(&mut self, quest: &Quest) {
        let index = match self.position(&quest.id) {
            Some(index) => index,
            None => {
                let widget = self.spawn_widget(QuestLogMessage::new(quest.title.as_str()));
                self.entries.push(PanelEntry {
                    quest_id: Some(quest.id.clone()),
                    widget,
                });
                self.entries.len() - 1
            }
        };

        if let Some(update) = quest.latest_update() {
            self.entries[index]
                .widget
                .add_line(QuestLogMessage::new(update));
        }
    }

    /// 任务完成：清空整个面板
    pub fn on_quest_completed(&mut self, quest_id: &str) {
        if self.position(quest_id).is_some() {
            debug!(quest = %quest_id, "任务完成，清空任务日志");
            self.clear();
        }
    }

    /// 添加一条普通消息
    pub fn add_message(&mut self, text: LocalizableText) {
        let widget = self.spawn_widget(QuestLogMessage::new(text));
        self.entries.push(PanelEntry {
            quest_id: None,
            widget,
        });
    }

    /// 追加到最后一个条目（按插入顺序）
    pub fn append_message(&mut self, text: LocalizableText) {
        if let Some(last) = self.entries.last_mut() {
            last.widget.append(text);
        }
    }

    /// 清空所有条目，条目回收到对象池
    pub fn clear(&mut self) {
        for mut entry in self.entries.drain(..) {
            entry.widget.deactivate();
            self.pool.push(entry.widget);
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// 任务对应的条目
    pub fn entry(&self, quest_id: &str) -> Option<&MessageWidget> {
        self.position(quest_id).map(|index| &self.entries[index].widget)
    }

    /// 所有条目（按插入顺序）
    pub fn entries(&self) -> impl Iterator<Item = &MessageWidget> {
        self.entries.iter().map(|entry| &entry.widget)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 对象池中的条目数
    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// 新创建过的条目数
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// 以文本行的形式渲染面板
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            lines.push(entry.widget.text().to_string());
            for line in entry.widget.lines() {
                lines.push(format!("  - {}", line.text()));
            }
        }
        lines
    }

    /// 导出状态（存档）
    pub fn get_state(&self) -> QuestLogPanelState {
        QuestLogPanelState {
            entries: self
                .entries
                .iter()
                .map(|entry| PanelEntryState {
                    quest_id: entry.quest_id.clone(),
                    message: entry.widget.get_state(),
                    lines: entry.widget.lines().iter().map(MessageWidget::get_state).collect(),
                })
                .collect(),
        }
    }

    /// 恢复状态（读档）
    pub fn set_state(&mut self, state: QuestLogPanelState) {
        self.clear();
        for entry in state.entries {
            let mut widget = self.spawn_widget(entry.message);
            for line in entry.lines {
                widget.add_line(line);
            }
            self.entries.push(PanelEntry {
                quest_id: entry.quest_id,
                widget,
            });
        }
    }

    fn position(&self, quest_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.quest_id.as_deref() == Some(quest_id))
    }

    fn spawn_widget(&mut self, message: QuestLogMessage) -> MessageWidget {
        let mut widget = self.pool.pop().unwrap_or_else(|| {
            self.created += 1;
            MessageWidget::default()
        });
        widget.initialize(message);
        widget
    }
}
