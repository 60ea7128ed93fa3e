//! # 任务日志消息
//!
//! [`QuestLogMessage`] 是可存档的不可变快照；[`MessageWidget`] 是界面中可复用的条目。

use serde::{Deserialize, Serialize};

use crate::text::LocalizableText;

/// 任务日志消息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLogMessage {
    text: LocalizableText,
}

impl QuestLogMessage {
    pub fn new(text: impl Into<LocalizableText>) -> Self {
        Self { text: text.into() }
    }

    /// 消息文本
    pub fn text(&self) -> &LocalizableText {
        &self.text
    }
}

/// 消息条目
///
/// 条目可以挂若干子行（任务进展）。回收后再次初始化时子行会被清空。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageWidget {
    text: LocalizableText,
    lines: Vec<MessageWidget>,
    active: bool,
}

impl MessageWidget {
    /// 用消息初始化（激活）条目
    pub fn initialize(&mut self, message: QuestLogMessage) {
        self.text = message.text;
        self.lines.clear();
        self.active = true;
    }

    /// 追加文本
    pub fn append(&mut self, text: LocalizableText) {
        self.text = std::mem::take(&mut self.text) + text;
    }

    /// 添加子行
    pub fn add_line(&mut self, message: QuestLogMessage) {
        let mut line = MessageWidget::default();
        line.initialize(message);
        self.lines.push(line);
    }

    /// 停用（回收前调用）
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &LocalizableText {
        &self.text
    }

    pub fn lines(&self) -> &[MessageWidget] {
        &self.lines
    }

    /// 当前内容的快照
    pub fn get_state(&self) -> QuestLogMessage {
        QuestLogMessage::new(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_reinitialize_clears_lines() {
        let mut widget = MessageWidget::default();
        widget.initialize(QuestLogMessage::new("寻找钥匙"));
        widget.add_line(QuestLogMessage::new("去了北边"));
        widget.append(LocalizableText::plain("（紧急）"));

        assert_eq!(widget.text().to_string(), "寻找钥匙（紧急）");
        assert_eq!(widget.lines().len(), 1);

        widget.deactivate();
        widget.initialize(QuestLogMessage::new("新任务"));
        assert!(widget.is_active());
        assert!(widget.lines().is_empty());
        assert_eq!(widget.get_state(), QuestLogMessage::new("新任务"));
    }

    #[test]
    fn test_message_serialization() {
        let message = QuestLogMessage::new(LocalizableText::localized("q.key", "钥匙"));
        let json = serde_json::to_string(&message).unwrap();
        let loaded: QuestLogMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(message, loaded);
    }
}
