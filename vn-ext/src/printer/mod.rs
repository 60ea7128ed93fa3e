//! # Printer 模块
//!
//! 文本打印指令的编排逻辑。
//!
//! ## 模块结构
//!
//! - [`actor`]：打印机 actor / 注册表 / 角色信息接口
//! - [`services`]：打印指令依赖的协作者集合
//! - [`print_text`]：`@print` 指令的执行流程

pub mod actor;
pub mod print_text;
pub mod services;

pub use actor::{CharacterManager, PrinterActor, PrinterManager};
pub use print_text::{PrintOutcome, PrintText, should_append_backlog};
pub use services::PrintServices;
