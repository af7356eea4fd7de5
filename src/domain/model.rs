use serde::{Deserialize, Serialize};

/// Text of one input file, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDocument {
    pub source: String,
    pub text: String,
}

impl SqlDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }

    /// Lines including their terminators, so joining them gives back `text`.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split_inclusive('\n')
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStats {
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub lines_written: usize,
    pub substitutions: usize,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub output: String,
    pub stats: TransformStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub pipeline: String,
    pub output_path: String,
    pub stats: TransformStats,
}
