use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ReferenceToken {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

impl ReferenceToken {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One unit of prompt content.
///
/// `Text` contributes one cursor unit per char, `Reference` and `Mode` always
/// contribute exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    Text { value: String },
    Reference(ReferenceToken),
    Mode(ReferenceToken),
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text {
            value: value.into(),
        }
    }

    pub fn reference(
        id: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Token::Reference(ReferenceToken::new(id, label, value))
    }

    pub fn mode(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Token::Mode(ReferenceToken::new(id, label, value))
    }

    pub fn cursor_len(&self) -> usize {
        match self {
            Token::Text { value } => value.chars().count(),
            Token::Reference(_) | Token::Mode(_) => 1,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Token::Text { .. })
    }

    pub fn is_mode(&self) -> bool {
        matches!(self, Token::Mode(_))
    }
}

pub fn cursor_length(token: &Token) -> usize {
    token.cursor_len()
}

pub fn total_length(tokens: &[Token]) -> usize {
    tokens.iter().map(Token::cursor_len).sum()
}

/// Builds the `[mode?, ...tokens]` sequence that cursor space is measured over.
pub fn virtual_tokens(mode: Option<&ReferenceToken>, tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() + 1);
    if let Some(mode) = mode {
        out.push(Token::Mode(mode.clone()));
    }
    out.extend(tokens.iter().filter(|t| !t.is_mode()).cloned());
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializeStyle {
    /// References contribute their `value` payload.
    #[default]
    Values,
    /// References contribute their display `label`.
    Labels,
}

pub type TokensToText = Arc<dyn Fn(&[Token]) -> String + Send + Sync>;

pub fn serialize(tokens: &[Token]) -> String {
    serialize_with(tokens, SerializeStyle::Values)
}

pub fn serialize_with(tokens: &[Token], style: SerializeStyle) -> String {
    tokens.iter().fold(String::new(), |mut out, token| {
        match token {
            Token::Text { value } => out.push_str(value),
            Token::Reference(reference) => match style {
                SerializeStyle::Values => out.push_str(&reference.value),
                SerializeStyle::Labels => out.push_str(&reference.label),
            },
            Token::Mode(_) => {}
        }
        out
    })
}
