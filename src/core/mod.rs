pub mod etl;
pub mod icons;
pub mod query_runner;
pub mod sanitizer;
pub mod schema_qualifier;
pub mod seed_injector;
pub mod seed_sql;
pub mod sql_text;
pub mod upsert_rewriter;

pub use crate::domain::model::{PipelineReport, SqlDocument, TransformResult, TransformStats};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;

use crate::utils::error::ToolingError;

/// Reads `path` from `storage` as UTF-8 text.
pub async fn read_document<S: Storage>(storage: &S, path: &str) -> Result<SqlDocument> {
    let bytes = storage.read_file(path).await?;
    let text = String::from_utf8(bytes).map_err(|e| ToolingError::ProcessingError {
        message: format!("{} is not valid UTF-8: {}", storage.describe(path), e),
    })?;
    Ok(SqlDocument::new(storage.describe(path), text))
}
