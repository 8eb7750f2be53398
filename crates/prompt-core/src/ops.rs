use std::ops::Range;

use crate::token::Token;

/// Merges adjacent text tokens and drops empty ones.
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Text { value } if value.is_empty() => {}
            Token::Text { value } => match out.last_mut() {
                Some(Token::Text { value: prev }) => prev.push_str(&value),
                _ => out.push(Token::Text { value }),
            },
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn split_chars(s: &str, at: usize) -> (&str, &str) {
    let byte = s.char_indices().nth(at).map(|(ix, _)| ix).unwrap_or(s.len());
    s.split_at(byte)
}

/// Splits a token sequence at a cursor position. A text token is only cut when
/// `pos` falls strictly inside it.
pub fn split_at(tokens: &[Token], pos: usize) -> (Vec<Token>, Vec<Token>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut acc = 0usize;

    for token in tokens {
        let len = token.cursor_len();
        if acc + len <= pos {
            left.push(token.clone());
        } else if acc >= pos {
            right.push(token.clone());
        } else if let Token::Text { value } = token {
            let (head, tail) = split_chars(value, pos - acc);
            left.push(Token::text(head));
            right.push(Token::text(tail));
        } else {
            right.push(token.clone());
        }
        acc += len;
    }

    (left, right)
}

/// Removes the cursor units in `range`. Tokens outside the range are left as is.
pub fn remove_units(tokens: &[Token], range: Range<usize>) -> Vec<Token> {
    if range.start >= range.end {
        return tokens.to_vec();
    }
    let (mut left, rest) = split_at(tokens, range.start);
    let (_, right) = split_at(&rest, range.end - range.start);
    left.extend(right);
    left
}

pub fn insert_at(tokens: &[Token], pos: usize, inserted: Vec<Token>) -> Vec<Token> {
    let (mut left, right) = split_at(tokens, pos);
    left.extend(inserted);
    left.extend(right);
    left
}

/// Index of the token holding the cursor unit that ends at `pos`, i.e. the
/// unit a backspace at `pos` would remove.
pub fn token_before(tokens: &[Token], pos: usize) -> Option<usize> {
    if pos == 0 {
        return None;
    }
    let mut acc = 0usize;
    for (ix, token) in tokens.iter().enumerate() {
        let len = token.cursor_len();
        if pos > acc && pos <= acc + len {
            return Some(ix);
        }
        acc += len;
    }
    None
}

/// The char immediately before `pos`, if that unit is text.
pub fn char_before(tokens: &[Token], pos: usize) -> Option<char> {
    let ix = token_before(tokens, pos)?;
    let start: usize = tokens[..ix].iter().map(Token::cursor_len).sum();
    tokens[ix].as_text()?.chars().nth(pos - start - 1)
}
