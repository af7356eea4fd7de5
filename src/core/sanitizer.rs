use crate::config::toml_config::SanitizeConfig;
use crate::core::sql_text::BANNER;
use crate::core::{read_document, Pipeline, SqlDocument, Storage, TransformResult, TransformStats};
use crate::utils::error::Result;
use chrono::Local;

/// Strips session directives and the database preamble from a raw `pg_dump` file.
pub struct DumpSanitizer<S: Storage> {
    storage: S,
    config: SanitizeConfig,
    extracted_on: String,
}

impl<S: Storage> DumpSanitizer<S> {
    pub fn new(storage: S, config: SanitizeConfig) -> Self {
        Self {
            storage,
            config,
            extracted_on: Local::now().format("%d/%m/%Y").to_string(),
        }
    }

    pub fn with_paths(mut self, input: Option<String>, output: Option<String>) -> Self {
        if let Some(input) = input {
            self.config.input = input;
        }
        if let Some(output) = output {
            self.config.output = output;
        }
        self
    }

    /// Pins the date written into the header.
    pub fn with_extraction_date(mut self, date: impl Into<String>) -> Self {
        self.extracted_on = date.into();
        self
    }

    fn header(&self) -> String {
        [
            BANNER.to_string(),
            "-- POSFATURIX - BASE DE DADOS LIMPA E COMPLETA".to_string(),
            BANNER.to_string(),
            "-- Extraído da base de dados em produção".to_string(),
            format!("-- Data de Extração: {}", self.extracted_on),
            format!("-- Versão: {}", self.config.dump_version),
            "--".to_string(),
            "-- INSTRUÇÕES:".to_string(),
            "-- 1. Conectar à base de dados já criada".to_string(),
            "-- 2. Executar este script completo".to_string(),
            "--".to_string(),
            "-- NOTA: Collation será a padrão do sistema (funciona em qualquer país)".to_string(),
            BANNER.to_string(),
            String::new(),
        ]
        .join("\n")
            + "\n"
    }

    fn starts_content(&self, line: &str) -> bool {
        self.config
            .start_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
    }

    fn is_blocked(&self, line: &str) -> bool {
        self.config
            .blocked_markers
            .iter()
            .any(|marker| line.contains(marker.as_str()))
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for DumpSanitizer<S> {
    fn name(&self) -> &str {
        "sanitize"
    }

    async fn extract(&self) -> Result<SqlDocument> {
        read_document(&self.storage, &self.config.input).await
    }

    async fn transform(&self, document: SqlDocument) -> Result<TransformResult> {
        let mut output = self.header();
        let mut stats = TransformStats::default();
        let mut copying = false;

        for (index, line) in document.lines().enumerate() {
            stats.lines_read += 1;

            if !copying {
                if self.starts_content(line) {
                    copying = true;
                    tracing::debug!("Copying from line {}", index + 1);
                } else {
                    stats.lines_skipped += 1;
                    continue;
                }
            }

            if self.is_blocked(line) {
                stats.substitutions += 1;
                continue;
            }

            output.push_str(line);
            stats.lines_written += 1;
        }

        if !copying {
            tracing::warn!(
                "⚠️ No line starting with {} found in {}; output holds the header only",
                self.config.start_prefixes.join(" or "),
                document.source
            );
        }
        tracing::info!(
            "Preamble lines skipped: {}, directives removed: {}",
            stats.lines_skipped,
            stats.substitutions
        );

        Ok(TransformResult { output, stats })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        self.storage
            .write_file(&self.config.output, result.output.as_bytes())
            .await?;
        Ok(self.storage.describe(&self.config.output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::MockStorage;

    const DUMP: &str = "--
-- PostgreSQL database dump
--

\\restrict abc123
SET statement_timeout = 0;
SET client_encoding = 'UTF8';
SELECT pg_catalog.set_config('search_path', '', false);
DROP DATABASE pdv_system;
CREATE DATABASE pdv_system WITH TEMPLATE = template0;
\\connect pdv_system

CREATE FUNCTION public.touch() RETURNS trigger
    LANGUAGE plpgsql
    AS $$ BEGIN RETURN NEW; END $$;

-- TOC entry 220 (class 1259 OID 16390)
SET row_security = off;
CREATE TABLE public.usuarios (
    id integer NOT NULL,
    nome character varying(100)
);

-- Completed on 2025-12-06 10:00:00

\\unrestrict abc123
";

    async fn sanitizer() -> DumpSanitizer<MockStorage> {
        let storage = MockStorage::new().with_file("../pdv2.sql", DUMP).await;
        DumpSanitizer::new(storage, SanitizeConfig::default()).with_extraction_date("06/12/2025")
    }

    #[tokio::test]
    async fn test_never_emits_blocked_lines() {
        let sanitizer = sanitizer().await;
        let doc = sanitizer.extract().await.unwrap();
        let result = sanitizer.transform(doc).await.unwrap();

        for line in result.output.lines() {
            for marker in &SanitizeConfig::default().blocked_markers {
                assert!(!line.contains(marker.as_str()), "{:?} leaked", line);
            }
        }
    }

    #[tokio::test]
    async fn test_skips_preamble_and_keeps_body() {
        let sanitizer = sanitizer().await;
        let doc = sanitizer.extract().await.unwrap();
        let result = sanitizer.transform(doc).await.unwrap();

        let body = result
            .output
            .split_once("CREATE FUNCTION")
            .map(|(_, rest)| rest)
            .unwrap();
        assert!(!result.output.contains("PostgreSQL database dump\n"));
        assert!(body.contains("CREATE TABLE public.usuarios ("));
        assert!(body.contains("-- Completed on 2025-12-06"));
        assert!(result.output.contains("-- Data de Extração: 06/12/2025\n"));
        assert!(result.output.contains("-- Versão: 2.5.0\n"));

        assert_eq!(result.stats.lines_skipped, 12);
        assert_eq!(result.stats.substitutions, 3);
        assert_eq!(
            result.stats.lines_read,
            result.stats.lines_skipped + result.stats.substitutions + result.stats.lines_written
        );
    }

    #[tokio::test]
    async fn test_header_only_when_no_content_start() {
        let storage = MockStorage::new()
            .with_file("../pdv2.sql", "SET xmloption = content;\nSELECT 1;\n")
            .await;
        let sanitizer = DumpSanitizer::new(storage, SanitizeConfig::default());
        let doc = sanitizer.extract().await.unwrap();
        let result = sanitizer.transform(doc).await.unwrap();

        assert_eq!(result.stats.lines_written, 0);
        assert_eq!(result.output, sanitizer.header());
    }

    #[tokio::test]
    async fn test_load_writes_configured_output() {
        let storage = MockStorage::new().with_file("../pdv2.sql", DUMP).await;
        let sanitizer = DumpSanitizer::new(storage.clone(), SanitizeConfig::default());
        let doc = sanitizer.extract().await.unwrap();
        let result = sanitizer.transform(doc).await.unwrap();
        let path = sanitizer.load(result).await.unwrap();

        assert_eq!(path, "mock://database_inicial_novo.sql");
        let written = storage.get_text("database_inicial_novo.sql").await.unwrap();
        assert!(written.starts_with(BANNER));
    }
}
