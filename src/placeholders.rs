//! Placeholder rewriting
//!
//! Accepts SQL written with DB-API-style `%s` placeholders and rewrites them
//! to PostgreSQL's positional `$n` before preparing. `%%` escapes a literal
//! percent. Placeholders inside string literals, quoted identifiers,
//! dollar-quoted bodies, and comments are left alone, as are `$n` parameters
//! already present.

use std::iter::Peekable;
use std::str::Chars;

enum State {
    Normal,
    SingleQuote,
    DoubleQuote,
    Dollar(String),
    LineComment,
    BlockComment(u32),
}

/// If the characters following a consumed `$` open a dollar quote, return
/// its tag body (empty for `$$`). Tags must not start with a digit, since
/// `$1` is a positional parameter.
fn dollar_tag(chars: &Peekable<Chars<'_>>) -> Option<String> {
    let mut look = chars.clone();
    let mut tag = String::new();
    loop {
        match look.next() {
            Some('$') => {
                if tag.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    return None;
                }
                return Some(tag);
            }
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => tag.push(c),
            _ => return None,
        }
    }
}

/// Rewrite `%s` placeholders to `$1..$n` in first-occurrence order.
///
/// SQL that already uses `$n` (or uses no parameters at all) passes through
/// unchanged.
pub fn positional(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut state = State::Normal;
    let mut next_param = 0u32;

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '%' => match chars.peek() {
                    Some('s') => {
                        chars.next();
                        next_param += 1;
                        out.push('$');
                        out.push_str(&next_param.to_string());
                    }
                    Some('%') => {
                        chars.next();
                        out.push('%');
                    }
                    _ => out.push('%'),
                },
                '\'' => {
                    out.push(c);
                    state = State::SingleQuote;
                }
                '"' => {
                    out.push(c);
                    state = State::DoubleQuote;
                }
                '-' if chars.peek() == Some(&'-') => {
                    out.push(c);
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    out.push(c);
                    out.push('*');
                    chars.next();
                    state = State::BlockComment(1);
                }
                '$' => {
                    out.push(c);
                    if let Some(tag) = dollar_tag(&chars) {
                        for _ in 0..tag.len() + 1 {
                            chars.next();
                        }
                        out.push_str(&tag);
                        out.push('$');
                        state = State::Dollar(tag);
                    }
                }
                _ => out.push(c),
            },
            State::SingleQuote => {
                out.push(c);
                if c == '\'' {
                    // '' is an escaped quote, not a terminator.
                    if chars.peek() == Some(&'\'') {
                        out.push('\'');
                        chars.next();
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuote => {
                out.push(c);
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        out.push('"');
                        chars.next();
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Dollar(ref tag) => {
                out.push(c);
                if c == '$' {
                    let mut look = chars.clone();
                    if tag.chars().all(|t| look.next() == Some(t)) && look.next() == Some('$') {
                        for _ in 0..tag.len() + 1 {
                            if let Some(consumed) = chars.next() {
                                out.push(consumed);
                            }
                        }
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                out.push(c);
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                out.push(c);
                // Block comments nest in PostgreSQL.
                if c == '/' && chars.peek() == Some(&'*') {
                    out.push('*');
                    chars.next();
                    state = State::BlockComment(depth + 1);
                } else if c == '*' && chars.peek() == Some(&'/') {
                    out.push('/');
                    chars.next();
                    state = if depth > 1 {
                        State::BlockComment(depth - 1)
                    } else {
                        State::Normal
                    };
                }
            }
        }
    }

    out
}
