//! # Backlog 模块
//!
//! 回看界面接口与回看消息模型。

use serde::{Deserialize, Serialize};

use crate::state::PlaybackSpot;
use crate::text::LocalizableText;

/// 回看消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogMessage {
    /// 消息文本
    pub text: LocalizableText,
    /// 作者（None 表示旁白）
    pub author_id: Option<String>,
    /// 消息开始的脚本位置
    pub spot: Option<PlaybackSpot>,
    /// 可重播的语音
    #[serde(default)]
    pub voice_paths: Vec<String>,
}

impl BacklogMessage {
    /// 追加文本与语音
    pub fn append(&mut self, text: LocalizableText, voice_path: Option<&str>) {
        self.text = std::mem::take(&mut self.text) + text;
        if let Some(path) = voice_path {
            self.voice_paths.push(path.to_string());
        }
    }
}

/// 回看界面
pub trait BacklogUi: Send + Sync {
    /// 新增一条消息
    fn add_message(
        &self,
        text: LocalizableText,
        author_id: Option<&str>,
        spot: Option<&PlaybackSpot>,
        voice_path: Option<&str>,
    );

    /// 追加到最后一条消息（不存在时忽略）
    fn append_message(&self, text: LocalizableText, voice_path: Option<&str>);
}
