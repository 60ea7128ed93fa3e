//! # Console 模块
//!
//! 终端输出：打印机文本在开始显示时写到标准输出，其余状态在结束时汇总输出。

use std::sync::Arc;

use async_trait::async_trait;
use vn_ext::memory::MemoryPrinterManager;
use vn_ext::{
    ActorError, AsyncToken, BacklogMessage, CharacterManager, LocalizableText, PrinterActor,
    PrinterManager, QuestLogPanel, ScrollLog, TextLocalizer,
};

/// 把打印内容同时写到终端的打印机注册表
pub struct ConsolePrinters {
    inner: Arc<MemoryPrinterManager>,
    localizer: Arc<dyn TextLocalizer>,
    characters: Arc<dyn CharacterManager>,
}

impl ConsolePrinters {
    pub fn new(
        inner: Arc<MemoryPrinterManager>,
        localizer: Arc<dyn TextLocalizer>,
        characters: Arc<dyn CharacterManager>,
    ) -> Self {
        Self {
            inner,
            localizer,
            characters,
        }
    }
}

#[async_trait]
impl PrinterManager for ConsolePrinters {
    fn default_printer_id(&self) -> String {
        self.inner.default_printer_id()
    }

    fn set_default_printer_id(&self, printer_id: &str) {
        self.inner.set_default_printer_id(printer_id);
    }

    fn actor(&self, printer_id: &str) -> Option<Arc<dyn PrinterActor>> {
        self.inner.actor(printer_id)
    }

    fn all_actors(&self) -> Vec<Arc<dyn PrinterActor>> {
        self.inner.all_actors()
    }

    async fn get_or_add_actor(
        &self,
        printer_id: &str,
    ) -> Result<Arc<dyn PrinterActor>, ActorError> {
        self.inner.get_or_add_actor(printer_id).await
    }

    async fn print_text(
        &self,
        printer_id: &str,
        text: LocalizableText,
        author_id: Option<&str>,
        speed: f32,
        token: AsyncToken,
    ) -> Result<(), ActorError> {
        let resolved = self.localizer.resolve(&text);
        match author_id {
            Some(author) => {
                let name = self
                    .characters
                    .display_name(author)
                    .unwrap_or_else(|| author.to_string());
                println!("[{printer_id}] {name}: {resolved}");
            }
            None => println!("[{printer_id}] {resolved}"),
        }
        self.inner
            .print_text(printer_id, text, author_id, speed, token)
            .await
    }
}

pub fn print_backlog(messages: &[BacklogMessage]) {
    println!("== 回看 ({}) ==", messages.len());
    for message in messages {
        let author = message.author_id.as_deref().unwrap_or("旁白");
        let voice = if message.voice_paths.is_empty() {
            String::new()
        } else {
            format!("  ♪ {}", message.voice_paths.join(", "))
        };
        println!("{author}: {}{voice}", message.text);
    }
}

pub fn print_quest_panel(panel: &QuestLogPanel) {
    println!("== 任务日志 ==");
    if panel.is_empty() {
        println!("（空）");
    }
    for line in panel.render() {
        println!("{line}");
    }
}

pub fn print_scroll_log(log: &ScrollLog) {
    println!("== 消息 ({}/{}) ==", log.len(), log.capacity());
    for message in log.messages() {
        println!("{}", message.text());
    }
}
