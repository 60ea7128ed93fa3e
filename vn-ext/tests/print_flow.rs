//! # 打印指令集成测试
//!
//! 测试 PrintText → 打印机 / 语音 / 回看 的执行链路。
//! 所有协作者都使用内存实现，时间使用 tokio 的暂停时钟。

use std::sync::Arc;
use std::time::Duration;

use vn_ext::config::{MAX_LINE_BREAKS, MAX_VISIBILITY_DURATION};
use vn_ext::memory::{
    CharacterNames, MemoryAudio, MemoryBacklog, MemoryPrinterManager, MemoryRollback,
    MemoryScriptPlayer,
};
use vn_ext::printer::should_append_backlog;
use vn_ext::{
    AsyncToken, AutoVoiceMode, ExtConfig, LocalizableText, PlaybackSpot, PrintServices, PrintText,
    PrinterActor, PrinterManager, PrinterMetadata, SourceLocalizer, TextLocalizer,
    VoiceOverlapPolicy,
};

/// 测试用协作者
struct Harness {
    printers: Arc<MemoryPrinterManager>,
    audio: Arc<MemoryAudio>,
    player: Arc<MemoryScriptPlayer>,
    rollback: Arc<MemoryRollback>,
    backlog: Arc<MemoryBacklog>,
    services: PrintServices,
}

impl Harness {
    fn new(config: ExtConfig) -> Self {
        Self::with_audio(config, MemoryAudio::new())
    }

    fn with_audio(config: ExtConfig, audio: MemoryAudio) -> Self {
        let printers = Arc::new(MemoryPrinterManager::new("Dialogue"));
        let audio = Arc::new(audio);
        let player = Arc::new(MemoryScriptPlayer::new());
        let rollback = Arc::new(MemoryRollback::new());
        let backlog = Arc::new(MemoryBacklog::new());
        let characters = CharacterNames::new().with_name("kohaku", "小春");

        let services = PrintServices {
            config: Arc::new(config),
            printers: printers.clone(),
            audio: audio.clone(),
            localizer: Arc::new(SourceLocalizer),
            characters: Arc::new(characters),
            player: player.clone(),
            rollback: Some(rollback.clone()),
            backlog: Some(backlog.clone()),
        };

        Self {
            printers,
            audio,
            player,
            rollback,
            backlog,
            services,
        }
    }

    fn printer_text(&self, id: &str) -> String {
        self.printers
            .printer(id)
            .map(|p| p.snapshot().text.to_string())
            .unwrap_or_default()
    }
}

/// 不等待输入的配置
fn no_wait_config() -> ExtConfig {
    let mut config = ExtConfig::default();
    config.printers.default_metadata.auto_wait = false;
    config
}

/// 让后台的显隐过渡跑完
async fn settle() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}

fn spot(line: usize) -> PlaybackSpot {
    PlaybackSpot::new("chapter1", line, 0)
}

// -------------------------------------------------------------------------
// 清空
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_auto_reset_clears_text() {
    let h = Harness::new(no_wait_config());
    h.printers.add_printer("Dialogue", true).set_text("旧文本".into());

    let outcome = PrintText::new("新文本")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert!(outcome.reset);
    assert!(outcome.printed);
    assert_eq!(h.printer_text("Dialogue"), "新文本");
}

#[tokio::test(start_paused = true)]
async fn test_explicit_no_reset_keeps_text() {
    let h = Harness::new(no_wait_config());
    h.printers.add_printer("Dialogue", true).set_text("旧文本".into());

    let mut print = PrintText::new("新文本");
    print.reset = Some(false);
    let outcome = print.execute(&h.services, AsyncToken::new()).await.unwrap();

    assert!(!outcome.reset);
    assert_eq!(h.printer_text("Dialogue"), "旧文本新文本");
}

// -------------------------------------------------------------------------
// 回看
// -------------------------------------------------------------------------

#[test]
fn test_backlog_append_conditions_each_required() {
    let meta = PrinterMetadata::default();
    let split = PrinterMetadata {
        split_backlog_messages: true,
        ..PrinterMetadata::default()
    };

    // 全部满足
    assert!(should_append_backlog(&meta, false, false, Some("a"), Some("a")));
    // 逐个破坏
    assert!(!should_append_backlog(&split, false, false, Some("a"), Some("a")));
    assert!(!should_append_backlog(&meta, true, false, Some("a"), Some("a")));
    assert!(!should_append_backlog(&meta, false, true, Some("a"), Some("a")));
    assert!(!should_append_backlog(&meta, false, false, Some("a"), Some("b")));
    // 旁白与旁白视为同一作者
    assert!(should_append_backlog(&meta, false, false, None, None));
}

#[tokio::test(start_paused = true)]
async fn test_backlog_append_and_add() {
    let h = Harness::new(no_wait_config());

    PrintText::new("第一句")
        .with_author("kohaku")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    let mut second = PrintText::new("第二句").with_author("kohaku");
    second.reset = Some(false);
    let outcome = second.execute(&h.services, AsyncToken::new()).await.unwrap();
    assert_eq!(outcome.appended_to_backlog, Some(true));

    let mut third = PrintText::new("换人了").with_author("other");
    third.reset = Some(false);
    let outcome = third.execute(&h.services, AsyncToken::new()).await.unwrap();
    assert_eq!(outcome.appended_to_backlog, Some(false));

    let messages = h.backlog.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text.to_string(), "第一句第二句");
    assert_eq!(messages[0].author_id.as_deref(), Some("kohaku"));
    assert_eq!(messages[1].author_id.as_deref(), Some("other"));
}

#[tokio::test(start_paused = true)]
async fn test_backlog_disabled_by_metadata() {
    let mut config = no_wait_config();
    config.printers.default_metadata.add_to_backlog = false;
    let h = Harness::new(config);

    let outcome = PrintText::new("不记录")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.appended_to_backlog, None);
    assert!(h.backlog.messages().is_empty());
}

// -------------------------------------------------------------------------
// 空文本
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_empty_text_skips_reveal_and_backlog() {
    let mut config = no_wait_config();
    config.audio.enable_auto_voicing = true;
    let audio = MemoryAudio::new().with_clip("chapter1/1.0", Duration::from_secs(1));
    let h = Harness::with_audio(config, audio);

    let outcome = PrintText::new(LocalizableText::empty())
        .with_spot(spot(1))
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    settle().await;

    assert!(!outcome.printed);
    assert_eq!(outcome.voice_path, None);
    assert_eq!(h.printers.print_calls(), 0);
    assert!(h.backlog.messages().is_empty());
    assert!(h.audio.play_log().is_empty());
    // 打印机仍然被显示
    assert!(h.printers.printer("Dialogue").unwrap().snapshot().visible);
}

// -------------------------------------------------------------------------
// 等待输入
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_waits_for_input_by_default() {
    let h = Harness::new(ExtConfig::default());
    // 提前按下继续，等待立即结束
    h.player.advance();

    let outcome = PrintText::new("等我")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert!(outcome.waited_for_input);
    assert_eq!(h.player.input_waits(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_reveal_does_not_wait_when_configured() {
    let mut config = ExtConfig::default();
    config.printers.default_metadata.wait_after_reveal_skip = false;
    let h = Harness::new(config);

    let token = AsyncToken::new();
    token.complete();

    let mut print = PrintText::new("跳过");
    print.wait_input = Some(true);
    let outcome = print.execute(&h.services, token).await.unwrap();

    assert!(!outcome.waited_for_input);
    assert_eq!(h.player.input_waits(), 0);
    // 跳过且没有等待输入时放开回档
    assert_eq!(h.rollback.allowed_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_reveal_still_waits_by_default() {
    let h = Harness::new(ExtConfig::default());
    h.player.advance();

    let token = AsyncToken::new();
    token.complete();

    let outcome = PrintText::new("跳过")
        .execute(&h.services, token)
        .await
        .unwrap();

    assert!(outcome.waited_for_input);
    assert_eq!(h.rollback.allowed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_input_false_never_allows_rollback() {
    let h = Harness::new(ExtConfig::default());
    let token = AsyncToken::new();
    token.complete();

    let mut print = PrintText::new("跳过");
    print.wait_input = Some(false);
    print.execute(&h.services, token).await.unwrap();

    assert_eq!(h.rollback.allowed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_canceled_token_returns_early() {
    let h = Harness::new(ExtConfig::default());
    let token = AsyncToken::new();
    token.cancel();

    let outcome = PrintText::new("取消")
        .execute(&h.services, token)
        .await
        .unwrap();

    assert!(outcome.canceled);
    assert!(!outcome.waited_for_input);
    assert!(h.backlog.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auto_play_waits_before_input() {
    let h = Harness::new(ExtConfig::default());
    h.player.set_auto_play(true);

    let started = tokio::time::Instant::now();
    let outcome = PrintText::new("abcde")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert!(outcome.waited_for_input);
    // 5 个字符 × 0.01 秒
    assert!(started.elapsed() >= Duration::from_millis(49));
}

// -------------------------------------------------------------------------
// 默认打印机
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_default_printer_hides_others() {
    let h = Harness::new(no_wait_config());
    let wide = h.printers.add_printer("Wide", true);
    let bubble = h.printers.add_printer("Bubble", true);

    let outcome = PrintText::new("你好")
        .with_printer("Fullscreen")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    settle().await;

    assert_eq!(outcome.printer_id, "Fullscreen");
    assert_eq!(h.printers.default_printer_id(), "Fullscreen");
    assert!(!wide.snapshot().visible);
    assert!(!bubble.snapshot().visible);
    assert!(h.printers.printer("Fullscreen").unwrap().snapshot().visible);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_non_default_keeps_others() {
    let h = Harness::new(no_wait_config());
    let wide = h.printers.add_printer("Wide", true);

    let mut print = PrintText::new("你好").with_printer("Bubble");
    print.default = Some(false);
    print.execute(&h.services, AsyncToken::new()).await.unwrap();
    settle().await;

    assert_eq!(h.printers.default_printer_id(), "Dialogue");
    assert!(wide.snapshot().visible);
}

// -------------------------------------------------------------------------
// 自动语音
// -------------------------------------------------------------------------

fn voiced_config(policy: VoiceOverlapPolicy) -> ExtConfig {
    let mut config = no_wait_config();
    config.audio.enable_auto_voicing = true;
    config.audio.voice_overlap_policy = policy;
    config
}

#[tokio::test(start_paused = true)]
async fn test_auto_voice_by_spot_goes_to_backlog() {
    let audio = MemoryAudio::new().with_clip("chapter1/3.0", Duration::from_millis(200));
    let h = Harness::with_audio(voiced_config(VoiceOverlapPolicy::AllowOverlap), audio);

    let started = tokio::time::Instant::now();
    let outcome = PrintText::new("有配音")
        .with_author("kohaku")
        .with_spot(spot(3))
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.voice_path.as_deref(), Some("chapter1/3.0"));
    // 不等待输入时等待语音播放结束
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(h.backlog.messages()[0].voice_paths, vec!["chapter1/3.0"]);
}

#[tokio::test(start_paused = true)]
async fn test_auto_voice_by_text_id() {
    let mut config = voiced_config(VoiceOverlapPolicy::AllowOverlap);
    config.audio.auto_voice_mode = AutoVoiceMode::TextId;
    let audio = MemoryAudio::new().with_clip("Text/greet", Duration::from_millis(10));
    let h = Harness::with_audio(config, audio);

    let outcome = PrintText::new(LocalizableText::localized("greet", "早上好"))
        .with_spot(spot(1))
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.voice_path.as_deref(), Some("Text/greet"));
}

#[tokio::test(start_paused = true)]
async fn test_no_auto_voice_when_missing_or_skipping() {
    let audio = MemoryAudio::new().with_clip("chapter1/2.0", Duration::from_millis(10));
    let h = Harness::with_audio(voiced_config(VoiceOverlapPolicy::AllowOverlap), audio);

    // 没有对应的语音
    let outcome = PrintText::new("无配音")
        .with_spot(spot(1))
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.voice_path, None);

    // 快进模式
    h.player.set_skip(true);
    let outcome = PrintText::new("快进")
        .with_spot(spot(2))
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.voice_path, None);
    assert!(h.audio.play_log().is_empty());
}

/// 先播放一段长语音，再以给定策略打印
async fn overlap_stops(policy: VoiceOverlapPolicy, printer_author: &str, author: &str) -> usize {
    let audio = MemoryAudio::new()
        .with_clip("long", Duration::from_secs(60))
        .with_clip("chapter1/5.0", Duration::from_millis(10));
    let h = Harness::with_audio(voiced_config(policy), audio);
    h.printers
        .add_printer("Dialogue", true)
        .set_author_id(Some(printer_author));

    use vn_ext::AudioManager;
    h.audio
        .play_voice("long", Some(printer_author), AsyncToken::new())
        .await
        .unwrap();

    let mut print = PrintText::new("新台词").with_author(author).with_spot(spot(5));
    print.reset = Some(false);
    print.execute(&h.services, AsyncToken::new()).await.unwrap();
    h.audio.stop_count()
}

#[tokio::test(start_paused = true)]
async fn test_voice_overlap_policies() {
    assert_eq!(
        overlap_stops(VoiceOverlapPolicy::AllowOverlap, "kohaku", "kohaku").await,
        0
    );
    assert_eq!(
        overlap_stops(VoiceOverlapPolicy::PreventOverlap, "kohaku", "other").await,
        1
    );
    assert_eq!(
        overlap_stops(VoiceOverlapPolicy::PreventCharacterOverlap, "kohaku", "kohaku").await,
        1
    );
    assert_eq!(
        overlap_stops(VoiceOverlapPolicy::PreventCharacterOverlap, "kohaku", "other").await,
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_voice_metadata() {
    let mut config = no_wait_config();
    config.printers.default_metadata.stop_voice = true;
    let h = Harness::new(config);

    PrintText::new("安静")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    assert_eq!(h.audio.stop_count(), 1);
}

// -------------------------------------------------------------------------
// 换行与模板
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_auto_line_break_only_with_existing_text() {
    let mut config = no_wait_config();
    config.printers.default_metadata.auto_line_break = 1;
    config.printers.default_metadata.auto_reset = false;
    let h = Harness::new(config);

    PrintText::new("第一行")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    PrintText::new("第二行")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert_eq!(h.printer_text("Dialogue"), "第一行\n第二行");
}

#[tokio::test(start_paused = true)]
async fn test_explicit_line_breaks() {
    let h = Harness::new(no_wait_config());

    let mut print = PrintText::new("正文");
    print.line_breaks = Some(2);
    print.execute(&h.services, AsyncToken::new()).await.unwrap();

    assert_eq!(h.printer_text("Dialogue"), "\n\n正文");
}

#[tokio::test(start_paused = true)]
async fn test_line_breaks_do_not_count_as_existing_text() {
    let h = Harness::new(no_wait_config());

    let mut print = PrintText::new("hi");
    print.reset = Some(false);
    print.line_breaks = Some(1);
    let outcome = print.execute(&h.services, AsyncToken::new()).await.unwrap();

    // 追加判断发生在插入换行之前，空打印机 → 新增消息
    assert_eq!(outcome.appended_to_backlog, Some(false));
    assert_eq!(h.printer_text("Dialogue"), "\nhi");
    assert_eq!(h.backlog.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_line_break_count_is_capped() {
    let h = Harness::new(no_wait_config());

    let mut print = PrintText::new("正文");
    print.line_breaks = Some(u32::MAX);
    print.execute(&h.services, AsyncToken::new()).await.unwrap();

    let text = h.printer_text("Dialogue");
    assert_eq!(text.matches('\n').count(), MAX_LINE_BREAKS as usize);
    assert!(text.ends_with("正文"));
}

// -------------------------------------------------------------------------
// 显隐过渡时长
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_huge_fade_time_is_clamped() {
    let h = Harness::new(no_wait_config());

    let mut print = PrintText::new("hi");
    print.fade_time = Some(1e30);
    let outcome = print.execute(&h.services, AsyncToken::new()).await.unwrap();
    settle().await;

    assert!(outcome.printed);
    assert!(h.printers.printer("Dialogue").unwrap().snapshot().visible);
}

#[tokio::test(start_paused = true)]
async fn test_huge_metadata_visibility_duration_is_clamped() {
    let mut config = no_wait_config();
    config.printers.default_metadata.change_visibility_duration = 1e30;
    config.printers.default_metadata.wait_visibility_before_print = true;
    let h = Harness::new(config);

    let started = tokio::time::Instant::now();
    let outcome = PrintText::new("hi")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert!(outcome.printed);
    assert_eq!(started.elapsed().as_secs(), MAX_VISIBILITY_DURATION as u64);
}

// -------------------------------------------------------------------------
// 本地化
// -------------------------------------------------------------------------

/// 只翻译 `greeting` 的本地化器
struct GreetingLocalizer;

impl TextLocalizer for GreetingLocalizer {
    fn resolve(&self, text: &LocalizableText) -> String {
        match text.text_id() {
            Some("greeting") => "你好".to_string(),
            _ => text.to_string(),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_translated_text_with_empty_fallback_is_printed() {
    let mut h = Harness::new(no_wait_config());
    h.services.localizer = Arc::new(GreetingLocalizer);

    let outcome = PrintText::new(LocalizableText::localized("greeting", ""))
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();

    assert!(outcome.printed);
    assert_eq!(h.printers.print_calls(), 1);
    assert_eq!(h.backlog.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_authored_template() {
    let mut config = no_wait_config();
    config.printers.default_metadata.authored_template = Some("%AUTHOR%：「%TEXT%」".to_string());
    let h = Harness::new(config);

    PrintText::new("你好")
        .with_author("kohaku")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    assert_eq!(h.printer_text("Dialogue"), "小春：「你好」");

    // 没有显示名时使用作者 ID
    PrintText::new("嗨")
        .with_author("stranger")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    assert_eq!(h.printer_text("Dialogue"), "stranger：「嗨」");

    // 旁白不套模板
    PrintText::new("风声")
        .execute(&h.services, AsyncToken::new())
        .await
        .unwrap();
    assert_eq!(h.printer_text("Dialogue"), "风声");
}

// -------------------------------------------------------------------------
// 自动播放时长
// -------------------------------------------------------------------------

#[test]
fn test_auto_play_delay() {
    let h = Harness::new(ExtConfig::default());
    let text = LocalizableText::plain("ab c1!");

    // 4 个字母/数字 × lerp(0, 0.02, 0.5)
    let delay = PrintText::new(text.clone()).auto_play_delay(&text, &h.services);
    assert!((delay.as_secs_f32() - 0.04).abs() < 1e-4);

    let mut fast = PrintText::new(text.clone());
    fast.reveal_speed = 2.0;
    let delay = fast.auto_play_delay(&text, &h.services);
    assert!((delay.as_secs_f32() - 0.08).abs() < 1e-4);

    let mut config = ExtConfig::default();
    config.printers.scale_auto_wait = false;
    let h = Harness::new(config);
    let delay = fast.auto_play_delay(&text, &h.services);
    assert!((delay.as_secs_f32() - 0.04).abs() < 1e-4);
}
