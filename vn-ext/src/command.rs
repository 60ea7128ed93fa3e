//! # Command 模块
//!
//! 脚本指令。解析器把每一行脚本转换为一条 [`ScriptCommand`]，
//! 由 [`ScriptRunner`](crate::runner::ScriptRunner) 按顺序执行。
//!
//! ## 指令列表
//!
//! ```text
//! @print "文本" printer:Id author:Id speed:1 reset:bool default:bool waitInput:bool br:N fadeTime:秒
//! Author: 文本                         （通用文本行，等价于 @print）
//! @addQuest id:q title:"标题"
//! @addQuestUpdate id:q text:"进展"
//! @completeQuest id:q
//! @addQuestMessage text:"消息"
//! ```

use crate::printer::PrintText;
use crate::text::LocalizableText;

/// 脚本指令
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// 打印文本
    Print(PrintText),
    /// 开始任务
    AddQuest { id: String, title: String },
    /// 任务进展
    AddQuestUpdate { id: String, text: String },
    /// 完成任务
    CompleteQuest { id: String },
    /// 普通任务日志消息
    AddQuestMessage { text: LocalizableText },
}

impl ScriptCommand {
    /// 指令名（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            ScriptCommand::Print(_) => "print",
            ScriptCommand::AddQuest { .. } => "addQuest",
            ScriptCommand::AddQuestUpdate { .. } => "addQuestUpdate",
            ScriptCommand::CompleteQuest { .. } => "completeQuest",
            ScriptCommand::AddQuestMessage { .. } => "addQuestMessage",
        }
    }
}
