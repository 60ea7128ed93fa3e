//! # Config 模块
//!
//! 打印机、自动语音与任务日志的配置，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 指令参数（最高，例如 `reset:false`）
//! 2. 配置文件 (config.json) 中的打印机元数据
//! 3. 默认值（最低）

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// 打印机元数据
///
/// 每个打印机 actor 一份；指令未显式指定的行为都由这里决定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterMetadata {
    /// 打印前是否清空文本
    #[serde(default = "default_true")]
    pub auto_reset: bool,

    /// 打印时是否设为默认打印机并隐藏其他打印机
    #[serde(default = "default_true")]
    pub auto_default: bool,

    /// 打印完成后是否等待玩家输入
    #[serde(default = "default_true")]
    pub auto_wait: bool,

    /// 打印机已有文本时，自动插入的换行数
    #[serde(default)]
    pub auto_line_break: u32,

    /// 带作者时使用的模板，支持 `%AUTHOR%` 与 `%TEXT%`
    #[serde(default)]
    pub authored_template: Option<String>,

    /// 每次打印都作为独立的回看消息
    #[serde(default)]
    pub split_backlog_messages: bool,

    /// 是否记录到回看
    #[serde(default = "default_true")]
    pub add_to_backlog: bool,

    /// 打印前停止正在播放的语音
    #[serde(default)]
    pub stop_voice: bool,

    /// 打印前是否等待显示过渡结束
    #[serde(default)]
    pub wait_visibility_before_print: bool,

    /// 显示/隐藏过渡时长（秒）
    #[serde(default = "default_change_visibility_duration")]
    pub change_visibility_duration: f32,

    /// 文本显示后、等待输入前的帧数
    #[serde(default = "default_print_frame_delay")]
    pub print_frame_delay: u32,

    /// 玩家跳过文本显示后是否仍然等待输入
    #[serde(default = "default_true")]
    pub wait_after_reveal_skip: bool,
}

impl Default for PrinterMetadata {
    fn default() -> Self {
        Self {
            auto_reset: true,
            auto_default: true,
            auto_wait: true,
            auto_line_break: 0,
            authored_template: None,
            split_backlog_messages: false,
            add_to_backlog: true,
            stop_voice: false,
            wait_visibility_before_print: false,
            change_visibility_duration: default_change_visibility_duration(),
            print_frame_delay: default_print_frame_delay(),
            wait_after_reveal_skip: true,
        }
    }
}

/// 显示/隐藏过渡时长上限（秒）
pub const MAX_VISIBILITY_DURATION: f32 = 3600.0;
/// 单条指令插入的换行数上限
pub const MAX_LINE_BREAKS: u32 = 100;

/// 秒数转为过渡时长，限制在 `0..=MAX_VISIBILITY_DURATION`
pub fn visibility_duration_from_secs(secs: f32) -> Duration {
    // NaN 经过 max 后为 0
    let secs = secs.max(0.0).min(MAX_VISIBILITY_DURATION);
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
}

impl PrinterMetadata {
    /// 显示/隐藏过渡时长
    pub fn visibility_duration(&self) -> Duration {
        visibility_duration_from_secs(self.change_visibility_duration)
    }

    fn validate(&self, printer: &str) -> Result<(), ConfigError> {
        let secs = self.change_visibility_duration;
        if !secs.is_finite() || !(0.0..=MAX_VISIBILITY_DURATION).contains(&secs) {
            return Err(ConfigError::ValidationFailed(format!(
                "{printer}.change_visibility_duration 必须在 0 - {MAX_VISIBILITY_DURATION} 秒之间"
            )));
        }
        if self.auto_line_break > MAX_LINE_BREAKS {
            return Err(ConfigError::ValidationFailed(format!(
                "{printer}.auto_line_break 不能大于 {MAX_LINE_BREAKS}"
            )));
        }
        Ok(())
    }
}

/// 打印机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintersConfig {
    /// 未指定打印机时使用的打印机 ID
    #[serde(default = "default_printer_id")]
    pub default_printer_id: String,

    /// 没有单独配置的打印机使用的元数据
    #[serde(default)]
    pub default_metadata: PrinterMetadata,

    /// 按打印机 ID 单独配置的元数据
    #[serde(default)]
    pub metadata: HashMap<String, PrinterMetadata>,

    /// 自动播放的基础延迟系数 (0.0 - 1.0)
    #[serde(default = "default_base_auto_delay")]
    pub base_auto_delay: f32,

    /// 自动播放时每个字符的最大等待时长（秒）
    #[serde(default = "default_max_auto_wait_delay")]
    pub max_auto_wait_delay: f32,

    /// 自动播放延迟是否随显示速度缩放
    #[serde(default = "default_true")]
    pub scale_auto_wait: bool,

    /// 一帧的时长（毫秒）
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for PrintersConfig {
    fn default() -> Self {
        Self {
            default_printer_id: default_printer_id(),
            default_metadata: PrinterMetadata::default(),
            metadata: HashMap::new(),
            base_auto_delay: default_base_auto_delay(),
            max_auto_wait_delay: default_max_auto_wait_delay(),
            scale_auto_wait: true,
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl PrintersConfig {
    /// 获取打印机元数据，未配置时返回默认元数据
    pub fn metadata_or_default(&self, printer_id: &str) -> &PrinterMetadata {
        self.metadata
            .get(printer_id)
            .unwrap_or(&self.default_metadata)
    }

    /// 一帧的时长
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// 自动语音的查找方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoVoiceMode {
    /// 按文本 ID
    TextId,
    /// 按脚本位置
    #[default]
    PlaybackSpot,
}

/// 语音重叠策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceOverlapPolicy {
    /// 允许重叠
    AllowOverlap,
    /// 播放新语音前总是停止旧语音
    PreventOverlap,
    /// 同一角色的语音不重叠
    #[default]
    PreventCharacterOverlap,
}

/// 音频配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// 是否启用自动语音
    #[serde(default)]
    pub enable_auto_voicing: bool,

    /// 自动语音查找方式
    #[serde(default)]
    pub auto_voice_mode: AutoVoiceMode,

    /// 语音重叠策略
    #[serde(default)]
    pub voice_overlap_policy: VoiceOverlapPolicy,
}

/// 任务日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestLogConfig {
    /// 滚动日志最多保留的消息数
    #[serde(default = "default_quest_log_capacity")]
    pub capacity: usize,

    /// 存档中保留的消息数
    #[serde(default = "default_quest_log_save_capacity")]
    pub save_capacity: usize,
}

impl Default for QuestLogConfig {
    fn default() -> Self {
        Self {
            capacity: default_quest_log_capacity(),
            save_capacity: default_quest_log_save_capacity(),
        }
    }
}

/// 扩展配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtConfig {
    /// 打印机配置
    #[serde(default)]
    pub printers: PrintersConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 任务日志配置
    #[serde(default)]
    pub quest_log: QuestLogConfig,
}

fn default_true() -> bool {
    true
}

fn default_change_visibility_duration() -> f32 {
    0.35
}

fn default_print_frame_delay() -> u32 {
    1
}

fn default_printer_id() -> String {
    "Dialogue".to_string()
}

fn default_base_auto_delay() -> f32 {
    0.5
}

fn default_max_auto_wait_delay() -> f32 {
    0.02
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_quest_log_capacity() -> usize {
    300
}

fn default_quest_log_save_capacity() -> usize {
    30
}

impl ExtConfig {
    /// 从 JSON 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ExtConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置，文件不存在或无效时使用默认值
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存为 JSON 文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.printers.default_printer_id.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_printer_id 不能为空".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.printers.base_auto_delay) {
            return Err(ConfigError::ValidationFailed(
                "base_auto_delay 必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if self.printers.max_auto_wait_delay < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "max_auto_wait_delay 不能为负数".to_string(),
            ));
        }

        self.printers.default_metadata.validate("default_metadata")?;
        for (printer_id, metadata) in &self.printers.metadata {
            metadata.validate(printer_id)?;
        }

        if self.quest_log.save_capacity > self.quest_log.capacity {
            return Err(ConfigError::ValidationFailed(
                "quest_log.save_capacity 不能大于 capacity".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtConfig::default();
        assert_eq!(config.printers.default_printer_id, "Dialogue");
        assert!(config.printers.default_metadata.auto_reset);
        assert_eq!(config.quest_log.capacity, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "printers": {
                "metadata": { "Wide": { "auto_reset": false, "auto_line_break": 1 } }
            },
            "audio": { "enable_auto_voicing": true, "auto_voice_mode": "text_id" }
        }"#;
        let config: ExtConfig = serde_json::from_str(json).unwrap();

        let wide = config.printers.metadata_or_default("Wide");
        assert!(!wide.auto_reset);
        assert_eq!(wide.auto_line_break, 1);
        // 未写出的字段仍是默认值
        assert!(wide.auto_wait);

        let other = config.printers.metadata_or_default("Bubble");
        assert!(other.auto_reset);

        assert_eq!(config.audio.auto_voice_mode, AutoVoiceMode::TextId);
        assert_eq!(
            config.audio.voice_overlap_policy,
            VoiceOverlapPolicy::PreventCharacterOverlap
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = ExtConfig::default();

        config.printers.base_auto_delay = 2.0;
        assert!(config.validate().is_err());

        config.printers.base_auto_delay = 0.5;
        config.quest_log.save_capacity = config.quest_log.capacity + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visibility_duration_validation() {
        let json = r#"{
            "printers": { "default_metadata": { "change_visibility_duration": 1e30 } }
        }"#;
        let config: ExtConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
        // 未经验证的配置也不会溢出
        assert_eq!(
            config.printers.default_metadata.visibility_duration(),
            Duration::from_secs_f32(MAX_VISIBILITY_DURATION)
        );

        let mut config = ExtConfig::default();
        let wide = PrinterMetadata {
            change_visibility_duration: -1.0,
            ..PrinterMetadata::default()
        };
        config.printers.metadata.insert("Wide".to_string(), wide);
        assert!(config.validate().is_err());

        let mut config = ExtConfig::default();
        config.printers.default_metadata.auto_line_break = MAX_LINE_BREAKS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visibility_duration_from_secs() {
        assert_eq!(visibility_duration_from_secs(0.5), Duration::from_millis(500));
        assert_eq!(visibility_duration_from_secs(-3.0), Duration::ZERO);
        assert_eq!(visibility_duration_from_secs(f32::NAN), Duration::ZERO);
        assert_eq!(
            visibility_duration_from_secs(f32::INFINITY),
            Duration::from_secs_f32(MAX_VISIBILITY_DURATION)
        );
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ExtConfig::load_or_default("definitely/not/here.json");
        assert_eq!(config.printers.frame_interval(), Duration::from_millis(16));
    }
}
