//! # Parser 模块
//!
//! 逐行脚本解析器（手写，无 regex 依赖）。
//!
//! ```text
//! 原始文本 → 按行切分 → 跳过空行/注释 → @指令 / 通用文本行 → Vec<ScriptLine>
//! ```
//!
//! - 以 `;` 开头的行是注释
//! - 以 `@` 开头的行是指令，其余行是通用文本行
//! - 未知的参数名不会导致失败，只记录警告

mod helpers;


use tracing::warn;

use crate::command::ScriptCommand;
use crate::config::{MAX_LINE_BREAKS, MAX_VISIBILITY_DURATION};
use crate::error::ParseError;
use crate::printer::PrintText;
use crate::script::ast::{Script, ScriptLine};
use crate::state::PlaybackSpot;
use crate::text::LocalizableText;

pub use helpers::{RawParam, parse_bool, split_author, split_params};
use helpers::{parse_f32, parse_u32};

/// 脚本解析器
#[derive(Debug, Default)]
pub struct Parser {
    warnings: Vec<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析脚本文本
    ///
    /// `script_name` 用作每条指令的 [`PlaybackSpot`] 脚本名。
    pub fn parse(&mut self, script_name: &str, text: &str) -> Result<Script, ParseError> {
        self.warnings.clear();
        let mut script = Script::new(script_name);

        for (line_idx, raw) in text.lines().enumerate() {
            let line_number = line_idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            let spot = PlaybackSpot::new(script_name, line_number, 0);
            let command = match trimmed.strip_prefix('@') {
                Some(body) => self.parse_command(body, &spot)?,
                None => parse_generic_line(trimmed, &spot),
            };
            script.lines.push(ScriptLine { spot, command });
        }

        Ok(script)
    }

    /// 解析过程中的警告
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn parse_command(
        &mut self,
        body: &str,
        spot: &PlaybackSpot,
    ) -> Result<ScriptCommand, ParseError> {
        let line = spot.line_number;
        let (name, rest) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));
        if name.is_empty() {
            return Err(ParseError::InvalidLine {
                line,
                message: "缺少指令名".to_string(),
            });
        }

        let mut params = Params::new(name, line, split_params(rest, line)?)?;
        let command = if name.eq_ignore_ascii_case("print") {
            ScriptCommand::Print(parse_print(&mut params, spot)?)
        } else if name.eq_ignore_ascii_case("addQuest") {
            ScriptCommand::AddQuest {
                id: params.require_id()?,
                title: params.require("title")?,
            }
        } else if name.eq_ignore_ascii_case("addQuestUpdate") {
            ScriptCommand::AddQuestUpdate {
                id: params.require_id()?,
                text: params.require("text")?,
            }
        } else if name.eq_ignore_ascii_case("completeQuest") {
            ScriptCommand::CompleteQuest {
                id: params.require_id()?,
            }
        } else if name.eq_ignore_ascii_case("addQuestMessage") {
            let text = match params.take("text") {
                Some(text) => text,
                None => params.nameless_or_missing("text")?,
            };
            ScriptCommand::AddQuestMessage {
                text: LocalizableText::plain(text),
            }
        } else {
            return Err(ParseError::UnknownCommand {
                line,
                command: name.to_string(),
            });
        };

        for unused in params.unused() {
            let message = format!("第 {line} 行：指令 '@{name}' 忽略未知参数 '{unused}'");
            warn!("{message}");
            self.warnings.push(message);
        }
        Ok(command)
    }
}

fn parse_print(params: &mut Params, spot: &PlaybackSpot) -> Result<PrintText, ParseError> {
    let line = spot.line_number;
    let body = params.nameless.take().unwrap_or_default();
    let text = match params.take("textId") {
        Some(id) => LocalizableText::localized(id, body),
        None => LocalizableText::plain(body),
    };

    let mut print = PrintText::new(text).with_spot(spot.clone());
    print.printer_id = params.take("printer");
    print.author_id = params.take("author");
    if let Some(speed) = params.take("speed") {
        print.reveal_speed = parse_f32(&speed, "speed", line)?;
    }
    print.reset = params.take_bool("reset")?;
    print.default = params.take_bool("default")?;
    print.wait_input = params.take_bool("waitInput")?;
    if let Some(br) = params.take("br") {
        let count = parse_u32(&br, "br", line)?;
        if count > MAX_LINE_BREAKS {
            return Err(out_of_range("br", &br, MAX_LINE_BREAKS as f32, line));
        }
        print.line_breaks = Some(count);
    }
    if let Some(fade) = params.take("fadeTime") {
        let secs = parse_f32(&fade, "fadeTime", line)?;
        if secs > MAX_VISIBILITY_DURATION {
            return Err(out_of_range("fadeTime", &fade, MAX_VISIBILITY_DURATION, line));
        }
        print.fade_time = Some(secs);
    }
    Ok(print)
}

fn out_of_range(param: &str, value: &str, max: f32, line: usize) -> ParseError {
    ParseError::InvalidParameter {
        line,
        param: param.to_string(),
        message: format!("'{value}' 超出上限 {max}"),
    }
}

/// 通用文本行：`Author: text` 或 `text`
fn parse_generic_line(line: &str, spot: &PlaybackSpot) -> ScriptCommand {
    let (author, text) = split_author(line);
    let mut print = PrintText::new(LocalizableText::plain(text)).with_spot(spot.clone());
    print.author_id = author.map(str::to_string);
    ScriptCommand::Print(print)
}

/// 单条指令的参数表
struct Params {
    command: String,
    line: usize,
    nameless: Option<String>,
    named: Vec<(String, String)>,
}

impl Params {
    fn new(command: &str, line: usize, raw: Vec<RawParam>) -> Result<Self, ParseError> {
        let mut nameless = None;
        let mut named = Vec::new();
        for param in raw {
            match param.key {
                Some(key) => named.push((key, param.value)),
                None if nameless.is_none() => nameless = Some(param.value),
                None => {
                    return Err(ParseError::InvalidLine {
                        line,
                        message: format!("多余的无名参数 '{}'", param.value),
                    });
                }
            }
        }
        Ok(Self {
            command: command.to_string(),
            line,
            nameless,
            named,
        })
    }

    /// 取出命名参数（参数名大小写不敏感）
    fn take(&mut self, key: &str) -> Option<String> {
        let index = self
            .named
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.named.remove(index).1)
    }

    fn take_bool(&mut self, key: &str) -> Result<Option<bool>, ParseError> {
        self.take(key)
            .map(|value| parse_bool(&value, key, self.line))
            .transpose()
    }

    fn require(&mut self, key: &str) -> Result<String, ParseError> {
        self.take(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| self.missing(key))
    }

    /// `id:` 参数，也可以写成无名参数
    fn require_id(&mut self) -> Result<String, ParseError> {
        match self.take("id") {
            Some(id) if !id.is_empty() => Ok(id),
            Some(_) => Err(self.missing("id")),
            None => self.nameless_or_missing("id"),
        }
    }

    fn nameless_or_missing(&mut self, key: &str) -> Result<String, ParseError> {
        self.nameless
            .take()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| self.missing(key))
    }

    fn missing(&self, key: &str) -> ParseError {
        ParseError::MissingParameter {
            line: self.line,
            command: self.command.clone(),
            param: key.to_string(),
        }
    }

    /// 未被读取的参数名
    fn unused(self) -> Vec<String> {
        let mut keys: Vec<String> = self.named.into_iter().map(|(k, _)| k).collect();
        if self.nameless.is_some() {
            keys.push("<无名参数>".to_string());
        }
        keys
    }
}
