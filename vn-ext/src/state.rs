//! # State 模块
//!
//! 脚本执行位置。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 脚本播放位置
///
/// 指令在脚本中的稳定位置，用于按位置查找自动语音以及回看记录。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSpot {
    /// 脚本名（文件名，不含路径和扩展名）
    pub script_name: String,
    /// 行号（从 1 开始）
    pub line_number: usize,
    /// 同一行内的指令序号（从 0 开始）
    #[serde(default)]
    pub inline_index: usize,
}

impl PlaybackSpot {
    /// 创建新的播放位置
    pub fn new(script_name: impl Into<String>, line_number: usize, inline_index: usize) -> Self {
        Self {
            script_name: script_name.into(),
            line_number,
            inline_index,
        }
    }

    /// 脚本名是否有效
    pub fn is_valid(&self) -> bool {
        !self.script_name.is_empty()
    }
}

/// 格式：`script/line.inline`
impl fmt::Display for PlaybackSpot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{}",
            self.script_name, self.line_number, self.inline_index
        )
    }
}
