//! # Host CLI
//!
//! 在终端里运行脚本：打印机、语音、回看与任务日志都使用内存实现。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- scripts/chapter1.txt
//! cargo run -p host-cli -- scripts/chapter1.txt --auto --save save.json
//! cargo run -p host-cli -- scripts/chapter1.txt --config config.json --load save.json -v
//! ```
//!
//! 非自动模式下，每按一次回车推进一次；标准输入结束后切换为自动播放。

mod console;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use vn_ext::memory::{
    CharacterNames, MemoryAudio, MemoryBacklog, MemoryPrinterManager, MemoryRollback,
    MemoryScriptPlayer,
};
use vn_ext::quest::{QuestLogPanelState, ScrollLogState};
use vn_ext::save::keys;
use vn_ext::{
    AsyncToken, BacklogMessage, ExtConfig, GameStateMap, NotificationMark, Parser, PrintServices,
    QuestLogManager, QuestLogPanel, ScriptRunner, ScrollLog, SourceLocalizer,
};

use console::ConsolePrinters;

#[derive(clap::Parser)]
#[command(name = "vn-ext-cli")]
#[command(about = "在终端中运行视觉小说脚本")]
#[command(version)]
struct Cli {
    /// 脚本文件
    script: PathBuf,

    /// 配置文件（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 自动播放，不等待回车
    #[arg(short, long)]
    auto: bool,

    /// 结束时写入存档
    #[arg(long)]
    save: Option<PathBuf>,

    /// 开始前读取存档
    #[arg(long)]
    load: Option<PathBuf>,

    /// 速度为 1 时每个字符的显示时长（毫秒）
    #[arg(long, default_value = "0")]
    char_delay_ms: u64,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("无法创建 tokio 运行时")?;
    let result = runtime.block_on(run(cli));
    // 标准输入的读取无法取消，不等待它结束
    runtime.shutdown_background();
    result
}

/// 界面状态
struct Ui {
    panel: Arc<Mutex<QuestLogPanel>>,
    scroll: Arc<Mutex<ScrollLog>>,
    mark: Arc<Mutex<NotificationMark>>,
    backlog: Arc<MemoryBacklog>,
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ExtConfig::load(path)
            .with_context(|| format!("无法加载配置 {}", path.display()))?,
        None => ExtConfig::default(),
    };
    config.validate().context("配置无效")?;

    let text = fs::read_to_string(&cli.script)
        .with_context(|| format!("无法读取脚本 {}", cli.script.display()))?;
    let script_name = script_name(&cli.script);
    let mut parser = Parser::new();
    let script = parser
        .parse(&script_name, &text)
        .with_context(|| format!("脚本解析失败 {}", cli.script.display()))?;
    info!(script = %script_name, commands = script.len(), "脚本已加载");

    let player = Arc::new(MemoryScriptPlayer::new());
    player.set_auto_play(cli.auto);
    let localizer = Arc::new(SourceLocalizer);
    let characters = Arc::new(CharacterNames::new());
    let printers = Arc::new(
        MemoryPrinterManager::new(config.printers.default_printer_id.clone())
            .with_char_delay(Duration::from_millis(cli.char_delay_ms)),
    );
    let ui = Ui {
        panel: Arc::new(Mutex::new(QuestLogPanel::new())),
        scroll: Arc::new(Mutex::new(ScrollLog::from_config(&config.quest_log))),
        mark: Arc::new(Mutex::new(NotificationMark::new())),
        backlog: Arc::new(MemoryBacklog::new()),
    };

    let services = PrintServices {
        printers: Arc::new(ConsolePrinters::new(
            printers,
            localizer.clone(),
            characters.clone(),
        )),
        audio: Arc::new(MemoryAudio::new()),
        localizer,
        characters,
        player: player.clone(),
        rollback: Some(Arc::new(MemoryRollback::new())),
        backlog: Some(ui.backlog.clone()),
        config: Arc::new(config),
    };

    let mut runner = ScriptRunner::new(script, services, QuestLogManager::new());
    QuestLogPanel::attach(&ui.panel, runner.quests_mut());
    ScrollLog::attach(&ui.scroll, runner.quests_mut());
    NotificationMark::attach(&ui.mark, runner.quests_mut());

    if let Some(path) = &cli.load {
        load_game(path, &mut runner, &ui)?;
    }

    if !cli.auto {
        spawn_input_reader(player.clone());
    }

    let stop = AsyncToken::new();
    let summary = runner.run(&stop).await.context("脚本执行失败")?;
    info!(executed = summary.executed, "执行完成");

    print_summary(&ui);

    if let Some(path) = &cli.save {
        save_game(path, &runner, &ui)?;
    }
    Ok(())
}

fn script_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "script".to_string())
}

/// 每读到一行推进一次；输入结束后切换为自动播放
fn spawn_input_reader(player: Arc<MemoryScriptPlayer>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(_)) => player.advance(),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "读取标准输入失败");
                    break;
                }
            }
        }
        player.set_auto_play(true);
        player.advance();
    });
}

fn print_summary(ui: &Ui) {
    println!();
    console::print_backlog(&ui.backlog.messages());

    let mut mark = ui.mark.lock().unwrap_or_else(PoisonError::into_inner);
    if mark.is_visible() {
        println!("（任务日志有更新）");
    }
    let mut panel = ui.panel.lock().unwrap_or_else(PoisonError::into_inner);
    panel.show();
    mark.hide_mark();
    console::print_quest_panel(&panel);

    console::print_scroll_log(&ui.scroll.lock().unwrap_or_else(PoisonError::into_inner));
}

fn save_game(path: &Path, runner: &ScriptRunner, ui: &Ui) -> Result<()> {
    let mut map = GameStateMap::new();
    runner.save_state(&mut map)?;
    map.set_state(
        keys::QUEST_PANEL,
        &ui.panel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_state(),
    )?;
    map.set_state(
        keys::SCROLL_LOG,
        &ui.scroll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_state(),
    )?;
    map.set_state(keys::BACKLOG, &ui.backlog.messages())?;

    fs::write(path, map.to_json()?)
        .with_context(|| format!("无法写入存档 {}", path.display()))?;
    info!(path = %path.display(), "存档已保存");
    Ok(())
}

fn load_game(path: &Path, runner: &mut ScriptRunner, ui: &Ui) -> Result<()> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("无法读取存档 {}", path.display()))?;
    let map = GameStateMap::from_json(&json)?;

    runner.restore_state(&map)?;
    if let Some(state) = map.get_state::<QuestLogPanelState>(keys::QUEST_PANEL)? {
        ui.panel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_state(state);
    }
    if let Some(state) = map.get_state::<ScrollLogState>(keys::SCROLL_LOG)? {
        ui.scroll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_state(state);
    }
    if let Some(messages) = map.get_state::<Vec<BacklogMessage>>(keys::BACKLOG)? {
        ui.backlog.restore(messages);
    }
    info!(
        path = %path.display(),
        position = runner.position().index,
        "存档已读取"
    );
    Ok(())
}
