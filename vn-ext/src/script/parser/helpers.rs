//! # 辅助解析函数
//!
//! 手写的参数切分与取值函数，无正则依赖。

use crate::error::ParseError;

/// 指令参数（`key:value` 或无名参数）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParam {
    /// 参数名；无名参数为 None
    pub key: Option<String>,
    pub value: String,
}

/// 把 `@name` 之后的部分切分为参数
///
/// ```text
/// "你好" author:Kohaku title:"两个 词"  →  [None="你好", author="Kohaku", title="两个 词"]
/// ```
///
/// 引号内支持 `\"` 与 `\\` 转义。
pub fn split_params(body: &str, line: usize) -> Result<Vec<RawParam>, ParseError> {
    let mut params = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        if chars.peek() == Some(&'"') {
            let value = read_quoted(&mut chars, line)?;
            params.push(RawParam { key: None, value });
            continue;
        }

        let mut key = None;
        let mut buf = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            if c == ':' && key.is_none() {
                if buf.is_empty() {
                    return Err(ParseError::InvalidLine {
                        line,
                        message: "参数名为空".to_string(),
                    });
                }
                key = Some(std::mem::take(&mut buf));
                if chars.peek() == Some(&'"') {
                    buf = read_quoted(&mut chars, line)?;
                    break;
                }
                continue;
            }
            buf.push(c);
        }
        params.push(RawParam { key, value: buf });
    }

    Ok(params)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: usize,
) -> Result<String, ParseError> {
    // 开头的引号
    chars.next();
    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => value.push(escaped),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            _ => value.push(c),
        }
    }
    Err(ParseError::UnterminatedQuote { line })
}

/// 拆分通用文本行 `Author: text`
///
/// 作者 ID 不能包含空白；没有作者时返回 `(None, line)`。
pub fn split_author(line: &str) -> (Option<&str>, &str) {
    if let Some((author, text)) = line.split_once(": ") {
        let author = author.trim();
        if !author.is_empty() && !author.contains(char::is_whitespace) {
            return (Some(author), text.trim());
        }
    }
    (None, line.trim())
}

pub fn parse_bool(value: &str, param: &str, line: usize) -> Result<bool, ParseError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ParseError::InvalidParameter {
            line,
            param: param.to_string(),
            message: format!("'{value}' 不是布尔值"),
        })
    }
}

pub fn parse_f32(value: &str, param: &str, line: usize) -> Result<f32, ParseError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ParseError::InvalidParameter {
            line,
            param: param.to_string(),
            message: format!("'{value}' 不是非负数"),
        })
}

pub fn parse_u32(value: &str, param: &str, line: usize) -> Result<u32, ParseError> {
    value
        .parse::<u32>()
        .map_err(|e| ParseError::InvalidParameter {
            line,
            param: param.to_string(),
            message: e.to_string(),
        })
}
