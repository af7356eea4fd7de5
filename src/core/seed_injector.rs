use crate::config::toml_config::SeedConfig;
use crate::core::seed_sql::{
    render_guarded_block, render_simple_banner, render_upsert_block, SEED_BLOCK_TITLE,
    SIMPLE_BLOCK_TITLE,
};
use crate::core::{read_document, Pipeline, SqlDocument, Storage, TransformResult, TransformStats};
use crate::domain::catalog::SeedCatalog;
use crate::utils::error::{Result, ToolingError};
use crate::utils::validation::Validate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedVariant {
    /// `INSERT ... ON CONFLICT` block before `-- Completed on`.
    Initial,
    /// Idempotent `DO $$` block before `-- Completed on`.
    Final,
    /// Hand-written data file spliced before the dump-complete line.
    Simple,
}

impl fmt::Display for SeedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "initial",
            Self::Final => "final",
            Self::Simple => "simple",
        };
        f.write_str(name)
    }
}

impl FromStr for SeedVariant {
    type Err = ToolingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "initial" => Ok(Self::Initial),
            "final" => Ok(Self::Final),
            "simple" => Ok(Self::Simple),
            other => Err(ToolingError::InvalidConfigValueError {
                field: "seed.variant".to_string(),
                value: other.to_string(),
                reason: "Expected one of: initial, final, simple".to_string(),
            }),
        }
    }
}

/// Where the block goes relative to the located marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice<'a> {
    pub before: &'a str,
    pub marker_and_after: std::borrow::Cow<'a, str>,
    pub marker_found: bool,
}

/// Splits at the first occurrence of `marker`; without it, the whole text
/// comes first and `fallback` stands in for the marker.
pub fn split_at_marker<'a>(text: &'a str, marker: &str, fallback: &'a str) -> Splice<'a> {
    match text.find(marker) {
        Some(index) => Splice {
            before: &text[..index],
            marker_and_after: text[index..].into(),
            marker_found: true,
        },
        None => Splice {
            before: text,
            marker_and_after: fallback.into(),
            marker_found: false,
        },
    }
}

/// Splits at the start of the first line containing `needle`.
pub fn split_at_line_containing<'a>(text: &'a str, needle: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.contains(needle) {
            return Some(text.split_at(offset));
        }
        offset += line.len();
    }
    None
}

pub struct SeedInjector<S: Storage> {
    storage: S,
    config: SeedConfig,
    variant: SeedVariant,
    catalog: SeedCatalog,
    input: String,
    output: String,
}

impl<S: Storage> SeedInjector<S> {
    pub fn new(storage: S, config: SeedConfig, variant: SeedVariant) -> Self {
        let (input, output) = match variant {
            SeedVariant::Initial => (config.initial_input.clone(), config.initial_output.clone()),
            SeedVariant::Final => (config.final_input.clone(), config.final_output.clone()),
            SeedVariant::Simple => (config.simple_input.clone(), config.simple_output.clone()),
        };
        Self {
            storage,
            config,
            variant,
            catalog: SeedCatalog::pos_defaults(),
            input,
            output,
        }
    }

    pub fn with_paths(mut self, input: Option<String>, output: Option<String>) -> Self {
        if let Some(input) = input {
            self.input = input;
        }
        if let Some(output) = output {
            self.output = output;
        }
        self
    }

    async fn seed_block(&self) -> Result<String> {
        match self.variant {
            SeedVariant::Initial => {
                self.catalog.validate()?;
                Ok(render_upsert_block(&self.catalog))
            }
            SeedVariant::Final => {
                self.catalog.validate()?;
                Ok(render_guarded_block(&self.catalog))
            }
            SeedVariant::Simple => {
                let data = read_document(&self.storage, &self.config.simple_data).await?;
                tracing::debug!("Loaded {} bytes of seed data from {}", data.text.len(), data.source);
                Ok(format!("{}{}\n", render_simple_banner(), data.text))
            }
        }
    }

    fn ensure_not_seeded(&self, document: &SqlDocument) -> Result<()> {
        let signature = match self.variant {
            SeedVariant::Simple => SIMPLE_BLOCK_TITLE,
            SeedVariant::Initial | SeedVariant::Final => SEED_BLOCK_TITLE,
        };
        if document.text.contains(signature) {
            return Err(ToolingError::AlreadySeeded {
                file: document.source.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for SeedInjector<S> {
    fn name(&self) -> &str {
        match self.variant {
            SeedVariant::Initial => "seed (initial)",
            SeedVariant::Final => "seed (final)",
            SeedVariant::Simple => "seed (simple)",
        }
    }

    async fn extract(&self) -> Result<SqlDocument> {
        read_document(&self.storage, &self.input).await
    }

    async fn transform(&self, document: SqlDocument) -> Result<TransformResult> {
        self.ensure_not_seeded(&document)?;
        let block = self.seed_block().await?;

        let output = match self.variant {
            SeedVariant::Simple => {
                let (before, after) =
                    split_at_line_containing(&document.text, &self.config.simple_marker)
                        .ok_or_else(|| ToolingError::MarkerNotFound {
                            marker: self.config.simple_marker.clone(),
                            file: document.source.clone(),
                        })?;
                format!("{}{}{}", before, block, after)
            }
            SeedVariant::Initial | SeedVariant::Final => {
                let splice = split_at_marker(
                    &document.text,
                    &self.config.marker,
                    &self.config.fallback_trailer,
                );
                if !splice.marker_found {
                    tracing::warn!(
                        "⚠️ '{}' not found in {}; appending seed data at the end",
                        self.config.marker,
                        document.source
                    );
                }
                format!("{}{}\n{}", splice.before, block, splice.marker_and_after)
            }
        };

        let stats = TransformStats {
            lines_read: document.line_count(),
            lines_skipped: 0,
            lines_written: output.split_inclusive('\n').count(),
            substitutions: 1,
        };
        tracing::info!("Seed block of {} characters spliced in", block.len());
        Ok(TransformResult { output, stats })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        self.storage
            .write_file(&self.output, result.output.as_bytes())
            .await?;
        tracing::info!("Total characters: {}", result.output.chars().count());
        Ok(self.storage.describe(&self.output))
    }
}
