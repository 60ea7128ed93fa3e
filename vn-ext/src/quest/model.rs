//! # Quest 数据模型

use serde::{Deserialize, Serialize};

/// 任务
///
/// 只由 [`QuestLogManager`](super::QuestLogManager) 修改；界面只读取。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// 任务 ID（唯一且稳定）
    pub id: String,
    /// 显示标题
    pub title: String,
    /// 进展记录（只追加）
    #[serde(default)]
    pub updates: Vec<String>,
    /// 是否已完成（只会从 false 变为 true）
    #[serde(default)]
    pub completed: bool,
}

impl Quest {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            updates: Vec::new(),
            completed: false,
        }
    }

    pub(crate) fn add_update(&mut self, text: impl Into<String>) {
        self.updates.push(text.into());
    }

    pub(crate) fn complete(&mut self) {
        self.completed = true;
    }

    /// 最新进展
    pub fn latest_update(&self) -> Option<&str> {
        self.updates.last().map(String::as_str)
    }
}
