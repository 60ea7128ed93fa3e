//! # Quest 模块
//!
//! 任务日志：任务状态、事件与三个界面订阅者。
//!
//! - [`manager`]：任务状态与事件分发
//! - [`panel`]：按任务分组的任务面板
//! - [`scroll_log`]：有容量上限的滚动消息日志
//! - [`notification`]：任务提示角标

pub mod manager;
pub mod message;
pub mod model;
pub mod notification;
pub mod panel;
pub mod scroll_log;

pub use manager::{QuestEvent, QuestLogManager, QuestLogState, SubscriptionId};
pub use message::{MessageWidget, QuestLogMessage};
pub use model::Quest;
pub use notification::NotificationMark;
pub use panel::{PanelEntryState, QuestLogPanel, QuestLogPanelState};
pub use scroll_log::{ScrollLog, ScrollLogState};
