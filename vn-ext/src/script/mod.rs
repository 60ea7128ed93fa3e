//! # Script 模块
//!
//! 脚本解析。
//!
//! ## 模块结构
//!
//! - [`ast`]：解析结果
//! - [`parser`]：逐行解析器

pub mod ast;
pub mod parser;

pub use ast::{Script, ScriptLine};
pub use parser::Parser;
