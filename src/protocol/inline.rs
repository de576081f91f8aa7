//! Parser for text command lines such as `SET key "value with spaces"`.
//!
//! Used by mass insertion and the command-line tool to turn human-written
//! lines into [`Command`]s.

use super::Command;
use crate::error::{Error, Result};

/// Parse one command line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.trim_start().starts_with('#') {
        return Ok(None);
    }

    let parts = split_words(line)?;
    if parts.is_empty() {
        return Ok(None);
    }

    Ok(Some(parts.into_iter().collect()))
}

/// Split on unquoted whitespace, honouring double quotes and escapes inside them.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // Distinguishes `""` (an empty argument) from no argument at all.
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() || quoted {
                    parts.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            '\\' if in_quotes => match chars.next() {
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some('t') => current.push('\t'),
                Some('"') => current.push('"'),
                Some('\\') => current.push('\\'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return Err(Error::InvalidCommand(format!(
            "unclosed quote in command line: {}",
            line
        )));
    }

    if !current.is_empty() || quoted {
        parts.push(current);
    }

    Ok(parts)
}
