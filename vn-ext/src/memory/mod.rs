//! # Memory 模块
//!
//! 协作者接口的内存实现，供 headless 宿主与测试使用。
//!
//! - [`printer`]：打印机与角色名
//! - [`audio`]：语音
//! - [`player`]：脚本播放器与回档栈
//! - [`backlog`]：回看

pub mod audio;
pub mod backlog;
pub mod player;
pub mod printer;

pub use audio::MemoryAudio;
pub use backlog::MemoryBacklog;
pub use player::{MemoryRollback, MemoryScriptPlayer};
pub use printer::{CharacterNames, MemoryPrinter, MemoryPrinterManager, PrinterState};
