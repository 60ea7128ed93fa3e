//! # Text 模块
//!
//! 可本地化文本模型。
//!
//! 一段 `LocalizableText` 由若干片段组成：普通文本，或者带文本 ID 的本地化引用。
//! 本地化引用在没有可用翻译时显示 `fallback`。

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// 文本片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPart {
    /// 普通文本
    Plain(String),
    /// 本地化引用
    Localized {
        /// 文本 ID（也用于按文本 ID 查找自动语音）
        id: String,
        /// 缺少翻译时使用的原文
        fallback: String,
    },
}

impl TextPart {
    fn is_empty(&self) -> bool {
        match self {
            TextPart::Plain(s) => s.is_empty(),
            TextPart::Localized { fallback, .. } => fallback.is_empty(),
        }
    }
}

/// 可本地化文本
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizableText {
    parts: Vec<TextPart>,
}

impl LocalizableText {
    /// 空文本
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从普通文本创建
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            parts: vec![TextPart::Plain(text)],
        }
    }

    /// 从本地化引用创建
    pub fn localized(id: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            parts: vec![TextPart::Localized {
                id: id.into(),
                fallback: fallback.into(),
            }],
        }
    }

    /// 用模板包装文本
    ///
    /// `template` 中第一个 `placeholder` 的位置被替换为 `text` 的全部片段。
    /// 模板中没有占位符时，`text` 追加在模板之后。
    pub fn from_template(template: &str, placeholder: &str, text: &LocalizableText) -> Self {
        let (before, after) = match template.find(placeholder) {
            Some(idx) => (&template[..idx], &template[idx + placeholder.len()..]),
            None => (template, ""),
        };

        LocalizableText::plain(before) + text.clone() + LocalizableText::plain(after)
    }

    /// 所有片段
    pub fn parts(&self) -> &[TextPart] {
        &self.parts
    }

    /// 是否为空（所有片段都为空）
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(TextPart::is_empty)
    }

    /// 第一个本地化片段的文本 ID
    pub fn text_id(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            TextPart::Localized { id, .. } => Some(id.as_str()),
            TextPart::Plain(_) => None,
        })
    }
}

impl Add for LocalizableText {
    type Output = LocalizableText;

    fn add(mut self, rhs: LocalizableText) -> LocalizableText {
        for part in rhs.parts {
            if part.is_empty() {
                continue;
            }
            // 相邻的普通文本合并为一个片段
            if let TextPart::Plain(next) = &part {
                if let Some(TextPart::Plain(last)) = self.parts.last_mut() {
                    last.push_str(next);
                    continue;
                }
            }
            self.parts.push(part);
        }
        self
    }
}

impl From<&str> for LocalizableText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for LocalizableText {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

/// 按原文（`fallback`）显示
impl fmt::Display for LocalizableText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                TextPart::Plain(s) => f.write_str(s)?,
                TextPart::Localized { fallback, .. } => f.write_str(fallback)?,
            }
        }
        Ok(())
    }
}

/// 文本本地化器
///
/// 把 `LocalizableText` 解析为当前语言下的显示字符串。
pub trait TextLocalizer: Send + Sync {
    fn resolve(&self, text: &LocalizableText) -> String;
}

/// 不做翻译的本地化器，直接使用原文
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLocalizer;

impl TextLocalizer for SourceLocalizer {
    fn resolve(&self, text: &LocalizableText) -> String {
        text.to_string()
    }
}
