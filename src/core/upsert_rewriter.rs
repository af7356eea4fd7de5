use crate::config::toml_config::RewriteConfig;
use crate::core::sql_text::{parse_column_list, parse_values_rows};
use crate::core::{read_document, Pipeline, SqlDocument, Storage, TransformResult, TransformStats};
use crate::utils::error::{Result, ToolingError};
use regex::{Captures, Regex};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// `INSERT ... ON CONFLICT (key) DO NOTHING` → per-row `IF NOT EXISTS` inserts.
    GuardRows { table: String },
    /// First `ON CONFLICT (key) DO NOTHING` → `DO UPDATE SET column = EXCLUDED.column`.
    UpdateOnConflict { key: String, column: String },
    /// `INSERT ... ON CONFLICT (key) DO UPDATE SET ...` → insert, else update.
    GuardWithUpdate { table: String },
}

impl RewriteRule {
    pub fn from_config(config: &RewriteConfig) -> Vec<Self> {
        let mut rules: Vec<Self> = config
            .guard_tables
            .iter()
            .map(|table| Self::GuardRows {
                table: table.clone(),
            })
            .collect();
        if let Some(key) = &config.update_on_conflict_key {
            rules.push(Self::UpdateOnConflict {
                key: key.clone(),
                column: "nome".to_string(),
            });
        }
        rules.extend(
            config
                .guard_with_update_tables
                .iter()
                .map(|table| Self::GuardWithUpdate {
                    table: table.clone(),
                }),
        );
        rules
    }

    /// Applies the rule to `text`, returning the new text and how many statements changed.
    pub fn apply(&self, text: &str) -> Result<(String, usize)> {
        match self {
            Self::GuardRows { table } => {
                let re = upsert_regex(table, r"DO\s+NOTHING\s*;")?;
                rewrite_matches(text, &re, |caps| guard_rows(table, caps))
            }
            Self::UpdateOnConflict { key, column } => {
                let re = compile(&format!(
                    r"(?i)ON\s+CONFLICT\s*\(\s*{}\s*\)\s*DO\s+NOTHING\s*;",
                    regex::escape(key)
                ))?;
                match re.find(text) {
                    Some(m) => {
                        let replacement = format!(
                            "ON CONFLICT ({}) DO UPDATE SET {} = EXCLUDED.{};",
                            key, column, column
                        );
                        let mut out = String::with_capacity(text.len() + 32);
                        out.push_str(&text[..m.start()]);
                        out.push_str(&replacement);
                        out.push_str(&text[m.end()..]);
                        Ok((out, 1))
                    }
                    None => Ok((text.to_string(), 0)),
                }
            }
            Self::GuardWithUpdate { table } => {
                let re = upsert_regex(table, r"DO\s+UPDATE\s+SET\s+(?P<set>[^;]*?)\s*;")?;
                rewrite_matches(text, &re, |caps| guard_with_update(table, caps))
            }
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ToolingError::ProcessingError {
        message: format!("invalid rewrite pattern: {}", e),
    })
}

/// The VALUES body may not contain `;`, so a match never spans two statements.
fn upsert_regex(table: &str, action: &str) -> Result<Regex> {
    compile(&format!(
        r"(?si)INSERT\s+INTO\s+{}\s*\((?P<cols>[^)]*)\)\s*VALUES(?P<values>[^;]*?)ON\s+CONFLICT\s*\(\s*(?P<key>\w+)\s*\)\s*{}",
        regex::escape(table),
        action
    ))
}

fn rewrite_matches<F>(text: &str, re: &Regex, mut render: F) -> Result<(String, usize)>
where
    F: FnMut(&Captures<'_>) -> Result<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).map(|m| (m.start(), m.end()));
        let Some((start, end)) = whole else { continue };
        out.push_str(&text[last..start]);
        out.push_str(&render(&caps)?);
        last = end;
        count += 1;
    }
    out.push_str(&text[last..]);
    Ok((out, count))
}

struct Upsert {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    key: String,
    key_index: usize,
}

fn parse_upsert(table: &str, caps: &Captures<'_>) -> Result<Upsert> {
    let columns = parse_column_list(&caps["cols"]);
    let rows = parse_values_rows(&caps["values"])?;
    let key = caps["key"].to_string();
    let key_index = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(&key))
        .ok_or_else(|| ToolingError::MalformedSql {
            message: format!("conflict key '{}' is not a column of {}", key, table),
        })?;
    if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
        return Err(ToolingError::MalformedSql {
            message: format!(
                "{} row has {} values for {} columns: ({})",
                table,
                row.len(),
                columns.len(),
                row.join(", ")
            ),
        });
    }
    Ok(Upsert {
        columns,
        rows,
        key,
        key_index,
    })
}

fn guard_rows(table: &str, caps: &Captures<'_>) -> Result<String> {
    let upsert = parse_upsert(table, caps)?;
    let columns = upsert.columns.join(", ");

    let mut out = format!("-- Inserir {} apenas se não existirem\nDO $$\nBEGIN\n", table);
    for row in &upsert.rows {
        let _ = writeln!(
            out,
            "    IF NOT EXISTS (SELECT 1 FROM {} WHERE {} = {}) THEN",
            table, upsert.key, row[upsert.key_index]
        );
        let _ = writeln!(
            out,
            "        INSERT INTO {} ({}) VALUES ({});",
            table,
            columns,
            row.join(", ")
        );
        out.push_str("    END IF;\n");
    }
    out.push_str("END $$;");
    Ok(out)
}

fn guard_with_update(table: &str, caps: &Captures<'_>) -> Result<String> {
    let upsert = parse_upsert(table, caps)?;
    let columns = upsert.columns.join(", ");
    let set_clause = &caps["set"];
    let excluded = compile(r"(?i)\bEXCLUDED\.(\w+)")?;

    let mut out = format!("-- Inserir {} apenas se não existir\nDO $$\nBEGIN\n", table);
    for row in &upsert.rows {
        let key_value = &row[upsert.key_index];

        let mut missing = None;
        let assignments = excluded.replace_all(set_clause, |c: &Captures<'_>| {
            match upsert
                .columns
                .iter()
                .position(|col| col.eq_ignore_ascii_case(&c[1]))
            {
                Some(index) => row[index].clone(),
                None => {
                    missing = Some(c[1].to_string());
                    c[0].to_string()
                }
            }
        });
        if let Some(column) = missing {
            return Err(ToolingError::MalformedSql {
                message: format!("EXCLUDED.{} is not a column of {}", column, table),
            });
        }

        let _ = writeln!(
            out,
            "    IF NOT EXISTS (SELECT 1 FROM {} WHERE {} = {}) THEN",
            table, upsert.key, key_value
        );
        let _ = writeln!(out, "        INSERT INTO {} ({})", table, columns);
        let _ = writeln!(out, "        VALUES ({});", row.join(", "));
        out.push_str("    ELSE\n");
        let _ = writeln!(
            out,
            "        UPDATE {} SET {} WHERE {} = {};",
            table,
            assignments.trim(),
            upsert.key,
            key_value
        );
        out.push_str("    END IF;\n");
    }
    out.push_str("END $$;");
    Ok(out)
}

/// Rewrites upserts in a seed file, in place unless an output is given.
pub struct UpsertRewriter<S: Storage> {
    storage: S,
    file: String,
    output: Option<String>,
    rules: Vec<RewriteRule>,
}

impl<S: Storage> UpsertRewriter<S> {
    pub fn new(storage: S, config: RewriteConfig) -> Self {
        Self {
            storage,
            rules: RewriteRule::from_config(&config),
            file: config.file,
            output: None,
        }
    }

    pub fn with_paths(mut self, input: Option<String>, output: Option<String>) -> Self {
        if let Some(input) = input {
            self.file = input;
        }
        self.output = output;
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for UpsertRewriter<S> {
    fn name(&self) -> &str {
        "rewrite-upserts"
    }

    async fn extract(&self) -> Result<SqlDocument> {
        read_document(&self.storage, &self.file).await
    }

    async fn transform(&self, document: SqlDocument) -> Result<TransformResult> {
        let mut text = document.text.clone();
        let mut substitutions = 0;

        for rule in &self.rules {
            let (rewritten, count) = rule.apply(&text)?;
            tracing::debug!("{:?}: {} statement(s) rewritten", rule, count);
            substitutions += count;
            text = rewritten;
        }

        if substitutions == 0 {
            tracing::warn!("⚠️ No upserts matched in {}; file left unchanged", document.source);
        }

        let stats = TransformStats {
            lines_read: document.line_count(),
            lines_skipped: 0,
            lines_written: text.split_inclusive('\n').count(),
            substitutions,
        };
        Ok(TransformResult {
            output: text,
            stats,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let target = self.output.as_deref().unwrap_or(&self.file);
        self.storage
            .write_file(target, result.output.as_bytes())
            .await?;
        Ok(self.storage.describe(target))
    }
}
