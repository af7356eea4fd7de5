use crate::config::toml_config::QualifyConfig;
use crate::core::{read_document, Pipeline, SqlDocument, Storage, TransformResult, TransformStats};
use crate::utils::error::{Result, ToolingError};
use regex::Regex;

/// Prefixes bare table references with a schema name.
pub struct SchemaQualifier<S: Storage> {
    storage: S,
    config: QualifyConfig,
    output: Option<String>,
}

const CLAUSES: [(&str, &str); 3] = [
    (r"FROM\s+", "FROM"),
    (r"INSERT\s+INTO\s+", "INSERT INTO"),
    (r"UPDATE\s+", "UPDATE"),
];

/// Qualifies every configured table after FROM, INSERT INTO and UPDATE.
/// Returns the new text and the number of references rewritten.
pub fn qualify_tables(text: &str, schema: &str, tables: &[String]) -> Result<(String, usize)> {
    let mut text = text.to_string();
    let mut substitutions = 0;

    for table in tables {
        for (pattern, keyword) in CLAUSES {
            let re = compile(&format!(r"(?i)\b{}{}\b", pattern, regex::escape(table)))?;
            let found = re.find_iter(&text).count();
            if found == 0 {
                continue;
            }
            substitutions += found;
            let replacement = format!("{} {}.{}", keyword, schema, table);
            text = re
                .replace_all(&text, regex::NoExpand(&replacement))
                .into_owned();
        }
    }

    Ok((collapse_repeated_prefix(&text, schema)?, substitutions))
}

/// `public.public.x` → `public.x`, for any number of repeats.
pub fn collapse_repeated_prefix(text: &str, schema: &str) -> Result<String> {
    let prefix = format!("{}.", regex::escape(schema));
    let re = compile(&format!(r"\b(?:{}){{2,}}", prefix))?;
    let single = format!("{}.", schema);
    Ok(re.replace_all(text, regex::NoExpand(&single)).into_owned())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ToolingError::ProcessingError {
        message: format!("invalid qualify pattern: {}", e),
    })
}

impl<S: Storage> SchemaQualifier<S> {
    pub fn new(storage: S, config: QualifyConfig) -> Self {
        Self {
            storage,
            config,
            output: None,
        }
    }

    /// Without an output the input file is rewritten in place.
    pub fn with_paths(mut self, input: Option<String>, output: Option<String>) -> Self {
        if let Some(input) = input {
            self.config.file = input;
        }
        self.output = output;
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for SchemaQualifier<S> {
    fn name(&self) -> &str {
        "qualify-schema"
    }

    async fn extract(&self) -> Result<SqlDocument> {
        read_document(&self.storage, &self.config.file).await
    }

    async fn transform(&self, document: SqlDocument) -> Result<TransformResult> {
        let (output, substitutions) =
            qualify_tables(&document.text, &self.config.schema, &self.config.tables)?;
        tracing::info!(
            "Qualified {} table reference(s) with '{}.'",
            substitutions,
            self.config.schema
        );

        let stats = TransformStats {
            lines_read: document.line_count(),
            lines_skipped: 0,
            lines_written: output.split_inclusive('\n').count(),
            substitutions,
        };
        Ok(TransformResult { output, stats })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let target = self.output.as_deref().unwrap_or(&self.config.file);
        self.storage
            .write_file(target, result.output.as_bytes())
            .await?;
        Ok(self.storage.describe(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::MockStorage;

    fn tables() -> Vec<String> {
        QualifyConfig::default().tables
    }

    #[test]
    fn test_qualifies_each_clause() {
        let sql = "INSERT INTO usuarios (nome) SELECT nome FROM perfis_usuario;\nupdate permissoes SET ativo = true;\n";
        let (out, count) = qualify_tables(sql, "public", &tables()).unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            out,
            "INSERT INTO public.usuarios (nome) SELECT nome FROM public.perfis_usuario;\nUPDATE public.permissoes SET ativo = true;\n"
        );
    }

    #[test]
    fn test_leaves_qualified_and_longer_names_alone() {
        let sql = "SELECT 1 FROM public.usuarios;\nSELECT 1 FROM usuarios_log;\nSELECT 1 FROM perfil_permissoes_old;\n";
        let (out, count) = qualify_tables(sql, "public", &tables()).unwrap();
        assert_eq!(count, 0);
        assert_eq!(out, sql);
    }

    #[test]
    fn test_never_produces_doubled_prefix() {
        let sql = "SELECT * FROM public.public.usuarios;\nINSERT INTO public.public.public.permissoes VALUES (1);\nDELETE FROM perfis_usuario;\n";
        let (out, _) = qualify_tables(sql, "public", &tables()).unwrap();

        assert!(!out.contains("public.public."));
        assert!(out.contains("FROM public.usuarios;"));
        assert!(out.contains("INTO public.permissoes VALUES"));
        assert!(out.contains("DELETE FROM public.perfis_usuario;"));
    }

    #[test]
    fn test_rerun_is_stable() {
        let sql = "UPDATE usuarios SET nome = 'Admin' WHERE codigo = (SELECT codigo FROM usuarios LIMIT 1);";
        let (once, _) = qualify_tables(sql, "public", &tables()).unwrap();
        let (twice, count) = qualify_tables(&once, "public", &tables()).unwrap();
        assert_eq!(count, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_perfil_permissoes_not_confused_with_permissoes() {
        let sql = "INSERT INTO perfil_permissoes (perfil_id) SELECT id FROM permissoes;";
        let (out, count) = qualify_tables(sql, "public", &tables()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            out,
            "INSERT INTO public.perfil_permissoes (perfil_id) SELECT id FROM public.permissoes;"
        );
    }

    #[tokio::test]
    async fn test_pipeline_rewrites_file_in_place() {
        let storage = MockStorage::new()
            .with_file(
                "dados_iniciais_usuario_permissoes.sql",
                "SELECT id FROM perfis_usuario;\n",
            )
            .await;
        let qualifier = SchemaQualifier::new(storage.clone(), QualifyConfig::default());
        let doc = qualifier.extract().await.unwrap();
        let result = qualifier.transform(doc).await.unwrap();
        qualifier.load(result).await.unwrap();

        assert_eq!(
            storage
                .get_text("dados_iniciais_usuario_permissoes.sql")
                .await
                .unwrap(),
            "SELECT id FROM public.perfis_usuario;\n"
        );
    }
}
