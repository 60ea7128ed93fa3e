//! # Audio 模块
//!
//! 语音播放接口与自动语音路径规则。
//!
//! 实际的加载与播放由宿主的音频系统负责。

use async_trait::async_trait;

use crate::config::AutoVoiceMode;
use crate::error::AudioError;
use crate::state::PlaybackSpot;
use crate::text::LocalizableText;
use crate::token::AsyncToken;

/// 按文本 ID 查找的语音所在目录
pub const TEXT_ID_VOICE_PREFIX: &str = "Text";

/// 音频管理器
#[async_trait]
pub trait AudioManager: Send + Sync {
    /// 语音资源是否存在
    async fn voice_exists(&self, path: &str) -> bool;

    /// 语音资源是否已加载
    fn is_voice_loaded(&self, path: &str) -> bool;

    /// 正在播放的语音路径
    fn played_voice_path(&self) -> Option<String>;

    /// 停止正在播放的语音
    fn stop_voice(&self);

    /// 播放语音
    ///
    /// 语音开始播放后即返回，不等待播放结束。
    async fn play_voice(
        &self,
        path: &str,
        author_id: Option<&str>,
        token: AsyncToken,
    ) -> Result<(), AudioError>;
}

/// 计算自动语音路径
///
/// - `TextId`：`Text/<文本 ID>`，文本没有 ID 时返回 `None`
/// - `PlaybackSpot`：`<脚本名>/<行号>.<行内序号>`，没有有效位置时返回 `None`
pub fn auto_voice_clip_path(
    mode: AutoVoiceMode,
    text: &LocalizableText,
    spot: Option<&PlaybackSpot>,
) -> Option<String> {
    match mode {
        AutoVoiceMode::TextId => text
            .text_id()
            .map(|id| format!("{TEXT_ID_VOICE_PREFIX}/{id}")),
        AutoVoiceMode::PlaybackSpot => spot.filter(|s| s.is_valid()).map(ToString::to_string),
    }
}
