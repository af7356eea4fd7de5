use crate::core::{Pipeline, PipelineReport, TransformResult};
use crate::utils::error::Result;

/// Drives one pipeline through extract, transform and load.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<PipelineReport> {
        let name = self.pipeline.name().to_string();
        tracing::info!("▶️ Running {}", name);

        let result = self.transform_only().await?;
        let stats = result.stats.clone();

        tracing::debug!("Loading {} bytes", result.output.len());
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("📁 {} written to {}", name, output_path);

        Ok(PipelineReport {
            pipeline: name,
            output_path,
            stats,
        })
    }

    /// Like [`run`](Self::run) but nothing is written; `output_path` is left empty.
    pub async fn dry_run(&self) -> Result<PipelineReport> {
        let result = self.transform_only().await?;
        tracing::info!("🔍 DRY RUN - {} would write {} bytes", self.pipeline.name(), result.output.len());
        Ok(PipelineReport {
            pipeline: self.pipeline.name().to_string(),
            output_path: String::new(),
            stats: result.stats,
        })
    }

    /// Extract and transform without writing anything.
    pub async fn transform_only(&self) -> Result<TransformResult> {
        let document = self.pipeline.extract().await?;
        tracing::info!(
            "📄 Read {} lines from {}",
            document.line_count(),
            document.source
        );

        let result = self.pipeline.transform(document).await?;
        tracing::info!(
            "🔧 Transformed: {} lines written, {} skipped, {} substitutions",
            result.stats.lines_written,
            result.stats.lines_skipped,
            result.stats.substitutions
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::QualifyConfig;
    use crate::core::schema_qualifier::SchemaQualifier;
    use crate::core::test_support::MockStorage;

    async fn storage() -> MockStorage {
        MockStorage::new()
            .with_file(
                "dados_iniciais_usuario_permissoes.sql",
                "SELECT 1 FROM usuarios;\nUPDATE permissoes SET ativo = true;\n",
            )
            .await
    }

    #[tokio::test]
    async fn test_run_reports_stats_and_path() {
        let storage = storage().await;
        let engine = EtlEngine::new(SchemaQualifier::new(storage.clone(), QualifyConfig::default()));
        let report = engine.run().await.unwrap();

        assert_eq!(report.pipeline, "qualify-schema");
        assert_eq!(report.output_path, "mock://dados_iniciais_usuario_permissoes.sql");
        assert_eq!(report.stats.lines_read, 2);
        assert_eq!(report.stats.substitutions, 2);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_storage_untouched() {
        let storage = storage().await;
        let engine = EtlEngine::new(SchemaQualifier::new(storage.clone(), QualifyConfig::default()));
        let report = engine.dry_run().await.unwrap();

        assert!(report.output_path.is_empty());
        assert_eq!(report.stats.substitutions, 2);
        assert_eq!(
            storage
                .get_text("dados_iniciais_usuario_permissoes.sql")
                .await
                .unwrap(),
            "SELECT 1 FROM usuarios;\nUPDATE permissoes SET ativo = true;\n"
        );
    }

    #[tokio::test]
    async fn test_missing_input_propagates() {
        let engine = EtlEngine::new(SchemaQualifier::new(MockStorage::new(), QualifyConfig::default()));
        assert!(engine.run().await.is_err());
    }
}
