//! # 内存打印机
//!
//! 不依赖渲染的打印机实现：文本直接写入内存，逐字显示只推进显示进度。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ActorError;
use crate::printer::actor::{CharacterManager, PrinterActor, PrinterManager};
use crate::text::LocalizableText;
use crate::token::AsyncToken;

/// 打印机状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrinterState {
    pub visible: bool,
    pub text: LocalizableText,
    pub author_id: Option<String>,
    pub reveal_progress: f32,
    /// 显隐过渡次数
    pub visibility_changes: usize,
}

/// 内存打印机
#[derive(Debug)]
pub struct MemoryPrinter {
    id: String,
    state: Mutex<PrinterState>,
}

impl MemoryPrinter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(PrinterState::default()),
        }
    }

    /// 当前状态
    pub fn snapshot(&self) -> PrinterState {
        self.lock().clone()
    }

    /// 直接设置可见性（不经过过渡）
    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    /// 设置作者
    pub fn set_author_id(&self, author_id: Option<&str>) {
        self.lock().author_id = author_id.map(str::to_string);
    }

    fn lock(&self) -> MutexGuard<'_, PrinterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PrinterActor for MemoryPrinter {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_visible(&self) -> bool {
        self.lock().visible
    }

    fn text(&self) -> LocalizableText {
        self.lock().text.clone()
    }

    fn set_text(&self, text: LocalizableText) {
        self.lock().text = text;
    }

    fn author_id(&self) -> Option<String> {
        self.lock().author_id.clone()
    }

    fn reveal_progress(&self) -> f32 {
        self.lock().reveal_progress
    }

    fn set_reveal_progress(&self, progress: f32) {
        self.lock().reveal_progress = progress.clamp(0.0, 1.0);
    }

    async fn change_visibility(
        &self,
        visible: bool,
        duration: Duration,
        token: AsyncToken,
    ) -> Result<(), ActorError> {
        {
            let mut state = self.lock();
            state.visible = visible;
            state.visibility_changes += 1;
        }
        debug!(printer = %self.id, visible, "打印机显隐过渡");

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = token.signaled() => {}
        }
        Ok(())
    }
}

/// 内存打印机注册表
#[derive(Debug)]
pub struct MemoryPrinterManager {
    printers: Mutex<Vec<Arc<MemoryPrinter>>>,
    default_printer_id: Mutex<String>,
    /// 速度为 1 时每个字符的显示时长
    char_delay: Duration,
    print_calls: AtomicUsize,
}

impl MemoryPrinterManager {
    /// 创建注册表，逐字显示瞬间完成
    pub fn new(default_printer_id: impl Into<String>) -> Self {
        Self {
            printers: Mutex::new(Vec::new()),
            default_printer_id: Mutex::new(default_printer_id.into()),
            char_delay: Duration::ZERO,
            print_calls: AtomicUsize::new(0),
        }
    }

    /// 设置每个字符的显示时长
    pub fn with_char_delay(mut self, delay: Duration) -> Self {
        self.char_delay = delay;
        self
    }

    /// 预先创建打印机
    pub fn add_printer(&self, printer_id: &str, visible: bool) -> Arc<MemoryPrinter> {
        let printer = self.get_or_create(printer_id);
        printer.set_visible(visible);
        printer
    }

    /// 按 ID 获取具体打印机
    pub fn printer(&self, printer_id: &str) -> Option<Arc<MemoryPrinter>> {
        self.printers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id == printer_id)
            .cloned()
    }

    /// 所有具体打印机（按创建顺序）
    pub fn printers(&self) -> Vec<Arc<MemoryPrinter>> {
        self.printers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `print_text` 被调用的次数
    pub fn print_calls(&self) -> usize {
        self.print_calls.load(Ordering::SeqCst)
    }

    fn get_or_create(&self, printer_id: &str) -> Arc<MemoryPrinter> {
        let mut printers = self.printers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(printer) = printers.iter().find(|p| p.id == printer_id) {
            return Arc::clone(printer);
        }
        let printer = Arc::new(MemoryPrinter::new(printer_id));
        printers.push(Arc::clone(&printer));
        printer
    }
}

#[async_trait]
impl PrinterManager for MemoryPrinterManager {
    fn default_printer_id(&self) -> String {
        self.default_printer_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_default_printer_id(&self, printer_id: &str) {
        *self
            .default_printer_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = printer_id.to_string();
    }

    fn actor(&self, printer_id: &str) -> Option<Arc<dyn PrinterActor>> {
        self.printer(printer_id)
            .map(|p| p as Arc<dyn PrinterActor>)
    }

    fn all_actors(&self) -> Vec<Arc<dyn PrinterActor>> {
        self.printers()
            .into_iter()
            .map(|p| p as Arc<dyn PrinterActor>)
            .collect()
    }

    async fn get_or_add_actor(
        &self,
        printer_id: &str,
    ) -> Result<Arc<dyn PrinterActor>, ActorError> {
        if printer_id.is_empty() {
            return Err(ActorError::Unavailable {
                id: printer_id.to_string(),
                message: "打印机 ID 为空".to_string(),
            });
        }
        let printer: Arc<dyn PrinterActor> = self.get_or_create(printer_id);
        Ok(printer)
    }

    async fn print_text(
        &self,
        printer_id: &str,
        text: LocalizableText,
        author_id: Option<&str>,
        speed: f32,
        token: AsyncToken,
    ) -> Result<(), ActorError> {
        self.print_calls.fetch_add(1, Ordering::SeqCst);
        let printer = self.get_or_create(printer_id);
        let char_count = text.to_string().chars().count();

        {
            let mut state = printer.lock();
            state.text = std::mem::take(&mut state.text) + text;
            state.author_id = author_id.map(str::to_string);
            state.reveal_progress = 0.0;
        }

        if !self.char_delay.is_zero() && speed > 0.0 && char_count > 0 {
            let per_char = self.char_delay.div_f32(speed);
            for revealed in 1..=char_count {
                tokio::select! {
                    _ = tokio::time::sleep(per_char) => {}
                    _ = token.signaled() => break,
                }
                printer.set_reveal_progress(revealed as f32 / char_count as f32);
            }
        }

        printer.set_reveal_progress(1.0);
        Ok(())
    }
}

/// 角色显示名表
#[derive(Debug, Clone, Default)]
pub struct CharacterNames {
    names: HashMap<String, String>,
}

impl CharacterNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, author_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(author_id.into(), name.into());
        self
    }
}

impl CharacterManager for CharacterNames {
    fn display_name(&self, author_id: &str) -> Option<String> {
        self.names.get(author_id).cloned()
    }
}
