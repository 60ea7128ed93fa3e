//! # PrintText 模块
//!
//! `@print` 指令：通过文本打印机逐字显示一段文本。
//!
//! ## 执行顺序
//!
//! ```text
//! 获取打印机 → 清空文本 → 显示打印机 → 设为默认打印机 → 停止语音
//!   → (空文本到此结束)
//!   → 决定是否追加回看 → 自动语音 → 换行 → 作者模板 → 逐字显示
//!   → 等待若干帧 → 等待输入 / 等待语音 → 写入回看
//! ```
//!
//! 所有 “是否要 X” 的判断都遵循同一规则：指令显式给出的值优先，否则使用打印机元数据。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::audio::auto_voice_clip_path;
use crate::config::{
    MAX_LINE_BREAKS, PrinterMetadata, VoiceOverlapPolicy, visibility_duration_from_secs,
};
use crate::error::{ActorError, PrintError};
use crate::printer::actor::PrinterActor;
use crate::printer::services::PrintServices;
use crate::state::PlaybackSpot;
use crate::text::LocalizableText;
use crate::token::{AsyncToken, wait_frame, wait_frames};

/// 作者模板中的作者名占位符
pub const AUTHOR_PLACEHOLDER: &str = "%AUTHOR%";
/// 作者模板中的正文占位符
pub const TEXT_PLACEHOLDER: &str = "%TEXT%";

/// 打印指令
///
/// 解析脚本行时构造，执行一次后丢弃。
#[derive(Debug, Clone, PartialEq)]
pub struct PrintText {
    /// 要打印的文本
    pub text: LocalizableText,
    /// 打印机 ID（None 使用默认打印机）
    pub printer_id: Option<String>,
    /// 作者 ID
    pub author_id: Option<String>,
    /// 显示速度倍率
    pub reveal_speed: f32,
    /// 是否清空打印机
    pub reset: Option<bool>,
    /// 是否设为默认打印机
    pub default: Option<bool>,
    /// 是否等待输入
    pub wait_input: Option<bool>,
    /// 打印前插入的换行数
    pub line_breaks: Option<u32>,
    /// 显示/隐藏过渡时长（秒）
    pub fade_time: Option<f32>,
    /// 指令所在的脚本位置
    pub spot: Option<PlaybackSpot>,
    auto_voice_path: Option<String>,
}

/// 打印结果
///
/// 记录执行过程中做出的决定，供宿主与测试观察。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintOutcome {
    /// 实际使用的打印机
    pub printer_id: String,
    /// 是否清空了打印机
    pub reset: bool,
    /// 是否进行了逐字显示
    pub printed: bool,
    /// 回看写入方式：`Some(true)` 追加，`Some(false)` 新增，`None` 未写入
    pub appended_to_backlog: Option<bool>,
    /// 是否等待了玩家输入
    pub waited_for_input: bool,
    /// 播放的自动语音
    pub voice_path: Option<String>,
    /// 显示后令牌已被取消
    pub canceled: bool,
}

/// 是否把本次文本追加到上一条回看消息
///
/// 必须在修改打印机文本（换行、显示）之前计算，反映打印前的状态。
pub fn should_append_backlog(
    metadata: &PrinterMetadata,
    reset: bool,
    printer_text_empty: bool,
    printer_author: Option<&str>,
    author: Option<&str>,
) -> bool {
    !metadata.split_backlog_messages && !reset && !printer_text_empty && author == printer_author
}

impl PrintText {
    /// 创建打印指令，其余参数使用默认值
    pub fn new(text: impl Into<LocalizableText>) -> Self {
        Self {
            text: text.into(),
            printer_id: None,
            author_id: None,
            reveal_speed: 1.0,
            reset: None,
            default: None,
            wait_input: None,
            line_breaks: None,
            fade_time: None,
            spot: None,
            auto_voice_path: None,
        }
    }

    pub fn with_printer(mut self, printer_id: impl Into<String>) -> Self {
        self.printer_id = Some(printer_id.into());
        self
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn with_spot(mut self, spot: PlaybackSpot) -> Self {
        self.spot = Some(spot);
        self
    }

    /// 执行打印
    pub async fn execute(
        &mut self,
        services: &PrintServices,
        token: AsyncToken,
    ) -> Result<PrintOutcome, PrintError> {
        let printer_id = self
            .printer_id
            .clone()
            .unwrap_or_else(|| services.printers.default_printer_id());
        let printer = services.printers.get_or_add_actor(&printer_id).await?;
        let metadata = services
            .config
            .printers
            .metadata_or_default(printer.id())
            .clone();

        let mut outcome = PrintOutcome {
            printer_id: printer.id().to_string(),
            ..Default::default()
        };

        outcome.reset = self.should_reset_text(&metadata);
        if outcome.reset {
            reset_text(printer.as_ref());
        }

        if !printer.is_visible() {
            self.show_printer(&printer, &metadata, &token).await?;
        }

        if self.should_set_default_printer(&metadata) {
            self.set_default_printer(&printer, services, &token);
        }

        if metadata.stop_voice {
            services.audio.stop_voice();
        }

        // 复制一份，避免多次求值
        let mut printed_text = self.text.clone();
        if services.localizer.resolve(&printed_text).is_empty() {
            debug!(printer = %printer.id(), "文本为空，跳过打印");
            return Ok(outcome);
        }

        let printer_text = printer.text();
        let printer_author = printer.author_id();
        let append_backlog = should_append_backlog(
            &metadata,
            outcome.reset,
            printer_text.is_empty(),
            printer_author.as_deref(),
            self.author_id.as_deref(),
        );

        if self.should_play_auto_voice(services) {
            outcome.voice_path = self
                .play_auto_voice(printer_author.as_deref(), services, &token)
                .await;
        }

        if self.should_append_line_break(&printer_text, &metadata) {
            let count = self.line_breaks.unwrap_or(metadata.auto_line_break);
            append_line_breaks(printer.as_ref(), count);
        }

        if let Some(template) = self.authored_template(&metadata) {
            printed_text = self.apply_authored_template(&printed_text, template, services);
        }

        debug!(
            printer = %printer.id(),
            author = ?self.author_id,
            speed = self.reveal_speed,
            "打印文本"
        );
        services
            .printers
            .print_text(
                printer.id(),
                printed_text.clone(),
                self.author_id.as_deref(),
                self.reveal_speed,
                token.clone(),
            )
            .await?;
        outcome.printed = true;

        if token.is_canceled() {
            outcome.canceled = true;
            return Ok(outcome);
        }

        let frame = services.config.printers.frame_interval();
        wait_frames(metadata.print_frame_delay, frame, &token).await;

        if self.should_wait_for_input(&metadata, &token) {
            self.wait_for_input(&printed_text, services, &token).await;
            outcome.waited_for_input = true;
        } else {
            if self.is_playing_auto_voice(services) {
                self.wait_auto_voice(services, &token).await;
            }
            if self.should_allow_rollback_when_input_not_awaited(&token) {
                if let Some(rollback) = &services.rollback {
                    rollback.allow_player_rollback();
                }
            }
        }

        if token.is_canceled() {
            outcome.canceled = true;
            return Ok(outcome);
        }

        if metadata.add_to_backlog {
            outcome.appended_to_backlog = self.add_backlog(printed_text, append_backlog, services);
        }

        Ok(outcome)
    }

    fn should_reset_text(&self, metadata: &PrinterMetadata) -> bool {
        self.reset.unwrap_or(metadata.auto_reset)
    }

    fn should_set_default_printer(&self, metadata: &PrinterMetadata) -> bool {
        self.default.unwrap_or(metadata.auto_default)
    }

    fn visibility_duration(&self, metadata: &PrinterMetadata) -> Duration {
        match self.fade_time {
            Some(secs) => visibility_duration_from_secs(secs),
            None => metadata.visibility_duration(),
        }
    }

    async fn show_printer(
        &self,
        printer: &Arc<dyn PrinterActor>,
        metadata: &PrinterMetadata,
        token: &AsyncToken,
    ) -> Result<(), ActorError> {
        let duration = self.visibility_duration(metadata);
        if metadata.wait_visibility_before_print {
            printer.change_visibility(true, duration, token.clone()).await
        } else {
            spawn_visibility_change(Arc::clone(printer), true, duration, token.clone());
            Ok(())
        }
    }

    fn set_default_printer(
        &self,
        printer: &Arc<dyn PrinterActor>,
        services: &PrintServices,
        token: &AsyncToken,
    ) {
        if services.printers.default_printer_id() != printer.id() {
            services.printers.set_default_printer_id(printer.id());
        }

        for other in services.printers.all_actors() {
            if other.id() == printer.id() || !other.is_visible() {
                continue;
            }
            let other_metadata = services.config.printers.metadata_or_default(other.id());
            let duration = self.visibility_duration(other_metadata);
            spawn_visibility_change(other, false, duration, token.clone());
        }
    }

    fn should_play_auto_voice(&self, services: &PrintServices) -> bool {
        services.config.audio.enable_auto_voicing
            && self.spot.as_ref().is_some_and(PlaybackSpot::is_valid)
            && !services.player.skip_active()
    }

    async fn play_auto_voice(
        &mut self,
        printer_author: Option<&str>,
        services: &PrintServices,
        token: &AsyncToken,
    ) -> Option<String> {
        if self.auto_voice_path.is_none() {
            self.auto_voice_path = auto_voice_clip_path(
                services.config.audio.auto_voice_mode,
                &self.text,
                self.spot.as_ref(),
            );
        }
        let path = self.auto_voice_path.clone()?;

        let audio = &services.audio;
        if !audio.voice_exists(&path).await {
            debug!(path = %path, "自动语音不存在");
            return None;
        }

        let played = audio.played_voice_path();
        let stop_previous = match services.config.audio.voice_overlap_policy {
            VoiceOverlapPolicy::AllowOverlap => false,
            VoiceOverlapPolicy::PreventOverlap => played.is_some(),
            VoiceOverlapPolicy::PreventCharacterOverlap => {
                played.is_some() && printer_author == self.author_id.as_deref()
            }
        };
        if stop_previous {
            audio.stop_voice();
        }

        match audio
            .play_voice(&path, self.author_id.as_deref(), token.clone())
            .await
        {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(path = %path, error = %e, "自动语音播放失败");
                None
            }
        }
    }

    fn is_playing_auto_voice(&self, services: &PrintServices) -> bool {
        let Some(path) = self.auto_voice_path.as_deref() else {
            return false;
        };
        self.should_play_auto_voice(services)
            && services.audio.played_voice_path().as_deref() == Some(path)
    }

    fn should_append_line_break(
        &self,
        printer_text: &LocalizableText,
        metadata: &PrinterMetadata,
    ) -> bool {
        match self.line_breaks {
            Some(count) => count > 0,
            None => metadata.auto_line_break > 0 && !printer_text.is_empty(),
        }
    }

    fn authored_template<'a>(&self, metadata: &'a PrinterMetadata) -> Option<&'a str> {
        let has_author = self.author_id.as_deref().is_some_and(|a| !a.is_empty());
        metadata
            .authored_template
            .as_deref()
            .filter(|template| has_author && !template.is_empty())
    }

    fn apply_authored_template(
        &self,
        text: &LocalizableText,
        template: &str,
        services: &PrintServices,
    ) -> LocalizableText {
        let author_id = self.author_id.as_deref().unwrap_or_default();
        let author = services
            .characters
            .display_name(author_id)
            .unwrap_or_else(|| author_id.to_string());
        LocalizableText::from_template(
            &template.replace(AUTHOR_PLACEHOLDER, &author),
            TEXT_PLACEHOLDER,
            text,
        )
    }

    fn should_wait_for_input(&self, metadata: &PrinterMetadata, token: &AsyncToken) -> bool {
        if token.is_completed() && !metadata.wait_after_reveal_skip {
            return false;
        }
        self.wait_input.unwrap_or(metadata.auto_wait)
    }

    fn should_allow_rollback_when_input_not_awaited(&self, token: &AsyncToken) -> bool {
        // 跳过显示且不等待输入时，需要手动放开回档
        self.wait_input != Some(false) && token.is_completed()
    }

    async fn wait_for_input(
        &self,
        text: &LocalizableText,
        services: &PrintServices,
        token: &AsyncToken,
    ) {
        if services.player.auto_play_active() {
            self.wait_auto_play_delay(text, services, token).await;
        }
        services.player.wait_for_input(token.clone()).await;
    }

    async fn wait_auto_voice(&self, services: &PrintServices, token: &AsyncToken) {
        let frame = services.config.printers.frame_interval();
        while self.is_playing_auto_voice(services) && token.is_active() {
            wait_frame(frame, token).await;
        }
    }

    async fn wait_auto_play_delay(
        &self,
        text: &LocalizableText,
        services: &PrintServices,
        token: &AsyncToken,
    ) {
        let delay = self.auto_play_delay(text, services);
        let frame = services.config.printers.frame_interval();
        let until = Instant::now() + delay;
        debug!(delay_ms = delay.as_millis() as u64, "自动播放等待");

        while (Instant::now() < until || self.is_playing_auto_voice(services)) && token.is_active()
        {
            wait_frame(frame, token).await;
        }
    }

    /// 自动播放模式下，显示完成后等待的时长
    ///
    /// 与可见字母/数字的数量成正比。
    pub fn auto_play_delay(&self, text: &LocalizableText, services: &PrintServices) -> Duration {
        let config = &services.config.printers;
        let base_delay = if config.scale_auto_wait {
            config.base_auto_delay * self.reveal_speed
        } else {
            config.base_auto_delay
        };
        let text_length = services
            .localizer
            .resolve(text)
            .chars()
            .filter(|c| c.is_alphanumeric())
            .count();
        let per_char = lerp(0.0, config.max_auto_wait_delay, base_delay);
        Duration::from_secs_f32((per_char * text_length as f32).max(0.0))
    }

    fn add_backlog(
        &self,
        text: LocalizableText,
        append: bool,
        services: &PrintServices,
    ) -> Option<bool> {
        let backlog = services.backlog.as_ref()?;
        let voice_path = self
            .auto_voice_path
            .as_deref()
            .filter(|path| services.audio.is_voice_loaded(path));

        if append {
            backlog.append_message(text, voice_path);
        } else {
            backlog.add_message(
                text,
                self.author_id.as_deref(),
                self.spot.as_ref(),
                voice_path,
            );
        }
        Some(append)
    }
}

fn reset_text(printer: &dyn PrinterActor) {
    printer.set_text(LocalizableText::empty());
    printer.set_reveal_progress(0.0);
}

fn append_line_breaks(printer: &dyn PrinterActor, count: u32) {
    let count = count.min(MAX_LINE_BREAKS) as usize;
    let breaks = LocalizableText::plain("\n".repeat(count));
    printer.set_text(printer.text() + breaks);
}

/// 后台执行显隐过渡，失败只记录日志
fn spawn_visibility_change(
    printer: Arc<dyn PrinterActor>,
    visible: bool,
    duration: Duration,
    token: AsyncToken,
) {
    tokio::spawn(async move {
        if let Err(e) = printer.change_visibility(visible, duration, token).await {
            warn!(printer = %printer.id(), visible, error = %e, "打印机显隐过渡失败");
        }
    });
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}
