use crate::utils::error::{Result, ToolingError};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_list, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "faturix-tools.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolingConfig {
    pub paths: PathsConfig,
    pub sanitize: SanitizeConfig,
    pub seed: SeedConfig,
    pub rewrite: RewriteConfig,
    pub qualify: QualifyConfig,
    pub icons: IconConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Every relative path below is resolved against this directory.
    pub base_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    pub input: String,
    pub output: String,
    pub start_prefixes: Vec<String>,
    pub blocked_markers: Vec<String>,
    pub dump_version: String,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            input: "../pdv2.sql".to_string(),
            output: "database_inicial_novo.sql".to_string(),
            start_prefixes: strings(&["CREATE FUNCTION", "CREATE TABLE"]),
            blocked_markers: strings(&[
                "\\restrict",
                "\\unrestrict",
                "\\connect",
                "DROP DATABASE",
                "CREATE DATABASE",
                "SET statement_timeout",
                "SET lock_timeout",
                "SET idle_in_transaction",
                "SET transaction_timeout",
                "SET client_encoding",
                "SET standard_conforming",
                "SELECT pg_catalog.set_config",
                "SET check_function_bodies",
                "SET xmloption",
                "SET client_min_messages",
                "SET row_security",
                "TOC entry",
            ]),
            dump_version: "2.5.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub marker: String,
    pub fallback_trailer: String,
    pub initial_input: String,
    pub initial_output: String,
    pub final_input: String,
    pub final_output: String,
    pub simple_marker: String,
    pub simple_input: String,
    pub simple_data: String,
    pub simple_output: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            marker: "-- Completed on".to_string(),
            fallback_trailer: "\n\n-- PostgreSQL database dump complete\n--\n".to_string(),
            initial_input: "database_inicial_novo.sql".to_string(),
            initial_output: "database_inicial.sql".to_string(),
            final_input: "estrutura_completa.sql".to_string(),
            final_output: "estrutura_completa_com_dados.sql".to_string(),
            simple_marker: "PostgreSQL database dump complete".to_string(),
            simple_input: "estrutura_completa.sql".to_string(),
            simple_data: "dados_iniciais_SIMPLES.sql".to_string(),
            simple_output: "estrutura_completa_com_dados_SIMPLES.sql".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub file: String,
    /// Multi-row `DO NOTHING` upserts turned into per-row existence checks.
    pub guard_tables: Vec<String>,
    /// Conflict key whose first `DO NOTHING` becomes `DO UPDATE SET nome = EXCLUDED.nome`.
    pub update_on_conflict_key: Option<String>,
    /// Single-row `DO UPDATE` upserts turned into insert-or-update blocks.
    pub guard_with_update_tables: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            file: "database_inicial.sql".to_string(),
            guard_tables: strings(&["perfis_usuario", "formas_pagamento", "familias", "setores"]),
            update_on_conflict_key: Some("codigo".to_string()),
            guard_with_update_tables: strings(&["usuarios"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifyConfig {
    pub file: String,
    pub schema: String,
    pub tables: Vec<String>,
}

impl Default for QualifyConfig {
    fn default() -> Self {
        Self {
            file: "dados_iniciais_usuario_permissoes.sql".to_string(),
            schema: "public".to_string(),
            tables: strings(&["perfis_usuario", "permissoes", "perfil_permissoes", "usuarios"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidDensity {
    pub name: String,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub source_dir: String,
    pub output_dir: String,
    pub full_source: String,
    pub simple_source: String,
    pub adaptive_source: String,
    pub full_sizes: Vec<u32>,
    pub simple_sizes: Vec<u32>,
    pub adaptive_sizes: Vec<u32>,
    pub ico_name: String,
    pub ico_sizes: Vec<u32>,
    pub android_densities: Vec<AndroidDensity>,
}

impl Default for IconConfig {
    fn default() -> Self {
        let density = |name: &str, size| AndroidDensity {
            name: name.to_string(),
            size,
        };
        Self {
            source_dir: "assets/icon".to_string(),
            output_dir: "assets/icon/generated".to_string(),
            full_source: "faturix_icon.svg".to_string(),
            simple_source: "faturix_icon_simple.svg".to_string(),
            adaptive_source: "faturix_icon_adaptive.svg".to_string(),
            full_sizes: vec![256, 512],
            simple_sizes: vec![16, 32, 48, 64, 96, 128, 144, 192],
            adaptive_sizes: vec![48, 72, 96, 144, 192, 512],
            ico_name: "app_icon.ico".to_string(),
            ico_sizes: vec![16, 32, 48, 256],
            android_densities: vec![
                density("mdpi", 48),
                density("hdpi", 72),
                density("xhdpi", 96),
                density("xxhdpi", 144),
                density("xxxhdpi", 192),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub client_path: String,
    pub host: String,
    pub user: String,
    pub database: String,
    /// Exported to the client as `PGPASSWORD`; when unset the client inherits the environment.
    pub password: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let client_path = if cfg!(windows) {
            r"C:\Program Files\PostgreSQL\18\bin\psql.exe"
        } else {
            "psql"
        };
        Self {
            client_path: client_path.to_string(),
            host: "127.0.0.1".to_string(),
            user: "postgres".to_string(),
            database: "pdv_system".to_string(),
            password: None,
            timeout_seconds: 30,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl ToolingConfig {
    /// Reads and parses a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ToolingError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ToolingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// `--config` wins; otherwise `faturix-tools.toml` in the working directory, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Expands `${VAR}` from the environment; unknown names stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ToolingError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn base_dir(&self) -> &str {
        &self.paths.base_dir
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ToolingError::ConfigError {
            message: format!("TOML serialization error: {}", e),
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("paths.base_dir", &self.paths.base_dir)?;

        validate_path("sanitize.input", &self.sanitize.input)?;
        validate_path("sanitize.output", &self.sanitize.output)?;
        validate_non_empty_list("sanitize.start_prefixes", &self.sanitize.start_prefixes)?;
        validate_non_empty_list("sanitize.blocked_markers", &self.sanitize.blocked_markers)?;

        validate_non_empty_string("seed.marker", &self.seed.marker)?;
        validate_non_empty_string("seed.simple_marker", &self.seed.simple_marker)?;
        for (field, path) in [
            ("seed.initial_input", &self.seed.initial_input),
            ("seed.initial_output", &self.seed.initial_output),
            ("seed.final_input", &self.seed.final_input),
            ("seed.final_output", &self.seed.final_output),
            ("seed.simple_input", &self.seed.simple_input),
            ("seed.simple_data", &self.seed.simple_data),
            ("seed.simple_output", &self.seed.simple_output),
            ("rewrite.file", &self.rewrite.file),
            ("qualify.file", &self.qualify.file),
        ] {
            validate_path(field, path)?;
        }

        validate_non_empty_string("qualify.schema", &self.qualify.schema)?;
        validate_non_empty_list("qualify.tables", &self.qualify.tables)?;

        self.validate_icons()?;

        validate_non_empty_string("database.client_path", &self.database.client_path)?;
        validate_non_empty_string("database.database", &self.database.database)?;
        validate_positive_number("database.timeout_seconds", self.database.timeout_seconds, 1)?;

        Ok(())
    }

    fn validate_icons(&self) -> Result<()> {
        let icons = &self.icons;
        validate_path("icons.source_dir", &icons.source_dir)?;
        validate_path("icons.output_dir", &icons.output_dir)?;
        for (field, file) in [
            ("icons.full_source", &icons.full_source),
            ("icons.simple_source", &icons.simple_source),
            ("icons.adaptive_source", &icons.adaptive_source),
        ] {
            validate_file_extension(field, file, &["svg"])?;
        }
        validate_file_extension("icons.ico_name", &icons.ico_name, &["ico"])?;

        for (field, sizes) in [
            ("icons.full_sizes", &icons.full_sizes),
            ("icons.simple_sizes", &icons.simple_sizes),
            ("icons.adaptive_sizes", &icons.adaptive_sizes),
        ] {
            for size in sizes {
                validate_range(field, *size, 1, 2048)?;
            }
        }
        for size in &icons.ico_sizes {
            validate_range("icons.ico_sizes", *size, 1, 256)?;
        }
        for density in &icons.android_densities {
            validate_non_empty_string("icons.android_densities.name", &density.name)?;
            validate_range("icons.android_densities.size", density.size, 1, 2048)?;
        }
        Ok(())
    }
}

impl Validate for ToolingConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_gives_builtin_defaults() {
        let config = ToolingConfig::from_toml_str("").unwrap();

        assert_eq!(config.sanitize.input, "../pdv2.sql");
        assert_eq!(config.sanitize.blocked_markers.len(), 17);
        assert_eq!(config.seed.marker, "-- Completed on");
        assert_eq!(config.rewrite.guard_tables.len(), 4);
        assert_eq!(config.qualify.schema, "public");
        assert_eq!(config.icons.ico_sizes, vec![16, 32, 48, 256]);
        assert_eq!(config.database.timeout_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml_content = r#"
[paths]
base_dir = "database"

[database]
host = "10.0.0.5"
"#;
        let config = ToolingConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database.host, "10.0.0.5");
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.base_dir(), "database");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FATURIX_TEST_DB_PASSWORD", "s3cret");

        let toml_content = r#"
[database]
password = "${FATURIX_TEST_DB_PASSWORD}"
"#;

        let config = ToolingConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database.password.as_deref(), Some("s3cret"));

        std::env::remove_var("FATURIX_TEST_DB_PASSWORD");
    }

    #[test]
    fn test_unknown_env_var_left_verbatim() {
        let config = ToolingConfig::from_toml_str(
            "[database]\npassword = \"${FATURIX_TEST_UNSET_VARIABLE}\"\n",
        )
        .unwrap();
        assert_eq!(
            config.database.password.as_deref(),
            Some("${FATURIX_TEST_UNSET_VARIABLE}")
        );
    }

    #[test]
    fn test_config_validation() {
        let config = ToolingConfig::from_toml_str("[icons]\nico_sizes = [16, 512]\n").unwrap();
        assert!(config.validate().is_err());

        let config = ToolingConfig::from_toml_str("[database]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = ToolingConfig::from_toml_str("[sanitize]\nblocked_markers = []\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ToolingConfig::from_toml_str("[database\n").unwrap_err();
        assert!(matches!(err, ToolingError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[qualify]\nschema = \"pos\"\ntables = [\"usuarios\"]\n")
            .unwrap();

        let config = ToolingConfig::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.qualify.schema, "pos");
        assert_eq!(config.qualify.tables, vec!["usuarios"]);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let text = ToolingConfig::default().to_toml_string().unwrap();
        let parsed = ToolingConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.icons.android_densities, ToolingConfig::default().icons.android_densities);
    }
}
