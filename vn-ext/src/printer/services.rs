//! # Services 模块
//!
//! 打印指令依赖的宿主协作者集合。

use std::sync::Arc;

use crate::audio::AudioManager;
use crate::backlog::BacklogUi;
use crate::config::ExtConfig;
use crate::player::{RollbackStack, ScriptPlayer};
use crate::printer::actor::{CharacterManager, PrinterManager};
use crate::text::TextLocalizer;

/// 打印指令的协作者
///
/// 由宿主构造后注入；默认打印机与正在播放的语音等共享状态由各实现自己持有。
#[derive(Clone)]
pub struct PrintServices {
    pub config: Arc<ExtConfig>,
    pub printers: Arc<dyn PrinterManager>,
    pub audio: Arc<dyn AudioManager>,
    pub localizer: Arc<dyn TextLocalizer>,
    pub characters: Arc<dyn CharacterManager>,
    pub player: Arc<dyn ScriptPlayer>,
    /// 回档栈（可选）
    pub rollback: Option<Arc<dyn RollbackStack>>,
    /// 回看界面（可选）
    pub backlog: Option<Arc<dyn BacklogUi>>,
}
