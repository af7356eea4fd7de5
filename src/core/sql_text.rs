//! Small helpers for reading and writing SQL text without a full parser.

use crate::utils::error::{Result, ToolingError};

pub const BANNER: &str = "-- =====================================================";

/// Quotes `value` as a SQL string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Splits the body of a `VALUES` clause into rows of raw value expressions.
///
/// Quoted literals (with `''` escapes), nested parentheses and `--` line
/// comments between rows are handled. Each value is returned trimmed, exactly
/// as written in the source.
pub fn parse_values_rows(body: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            current.push(c);
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_quote = false;
                }
            }
            continue;
        }

        match c {
            '\'' => {
                in_quote = true;
                current.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                if depth > 1 {
                    current.push(c);
                    continue;
                }
                // Comment: skip to end of line.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            ')' => {
                if depth == 0 {
                    return Err(malformed("unbalanced ')' in VALUES list"));
                }
                depth -= 1;
                if depth == 0 {
                    row.push(current.trim().to_string());
                    current.clear();
                    rows.push(std::mem::take(&mut row));
                } else {
                    current.push(c);
                }
            }
            ',' if depth == 1 => {
                row.push(current.trim().to_string());
                current.clear();
            }
            _ if depth == 0 => {
                if !(c.is_whitespace() || c == ',') {
                    return Err(malformed(&format!(
                        "unexpected '{}' between VALUES rows",
                        c
                    )));
                }
            }
            _ => current.push(c),
        }
    }

    if in_quote {
        return Err(malformed("unterminated string literal in VALUES list"));
    }
    if depth != 0 {
        return Err(malformed("unclosed '(' in VALUES list"));
    }
    Ok(rows)
}

/// Splits a parenthesised, comma separated identifier list such as `nome, descricao`.
pub fn parse_column_list(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn malformed(message: &str) -> ToolingError {
    ToolingError::MalformedSql {
        message: message.to_string(),
    }
}
