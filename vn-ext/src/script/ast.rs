//! # 脚本结构
//!
//! 解析后的脚本：带位置信息的指令序列。

use crate::command::ScriptCommand;
use crate::state::PlaybackSpot;

/// 带位置的脚本指令
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub spot: PlaybackSpot,
    pub command: ScriptCommand,
}

/// 解析后的脚本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    /// 脚本名
    pub name: String,
    /// 指令（按源文件顺序）
    pub lines: Vec<ScriptLine>,
}

impl Script {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 按索引获取指令
    pub fn get(&self, index: usize) -> Option<&ScriptLine> {
        self.lines.get(index)
    }
}
