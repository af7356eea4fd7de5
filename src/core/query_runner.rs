use crate::config::toml_config::DatabaseConfig;
use crate::utils::error::{Result, ToolingError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs single SQL statements through the PostgreSQL command-line client.
pub struct QueryRunner {
    config: DatabaseConfig,
}

impl QueryRunner {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Client arguments for `query`: tuples only, unaligned.
    pub fn args(&self, query: &str) -> Vec<String> {
        vec![
            "-U".to_string(),
            self.config.user.clone(),
            "-h".to_string(),
            self.config.host.clone(),
            "-d".to_string(),
            self.config.database.clone(),
            "-t".to_string(),
            "-A".to_string(),
            "-c".to_string(),
            query.to_string(),
        ]
    }

    /// Returns the client's trimmed stdout when it exits with status 0.
    pub async fn run_sql(&self, query: &str) -> Result<String> {
        let mut command = Command::new(&self.config.client_path);
        command
            .args(self.args(query))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(password) = &self.config.password {
            command.env("PGPASSWORD", password);
        }

        tracing::debug!(
            "Running {} against {}@{}/{}",
            self.config.client_path,
            self.config.user,
            self.config.host,
            self.config.database
        );

        let seconds = self.config.timeout_seconds;
        // Dropping the pending future kills the child.
        let output = tokio::time::timeout(Duration::from_secs(seconds), command.output())
            .await
            .map_err(|_| {
                tracing::warn!("Query timed out after {}s, killing client", seconds);
                ToolingError::Timeout { seconds }
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            return Ok(stdout.trim().to_string());
        }

        tracing::debug!("Client exited with {:?}", output.status.code());
        Err(ToolingError::QueryFailed {
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_follow_client_convention() {
        let runner = QueryRunner::new(DatabaseConfig::default());
        assert_eq!(
            runner.args("SELECT 1"),
            vec![
                "-U", "postgres", "-h", "127.0.0.1", "-d", "pdv_system", "-t", "-A", "-c",
                "SELECT 1"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_client_is_io_error() {
        let config = DatabaseConfig {
            client_path: "/nonexistent/faturix/psql".to_string(),
            ..DatabaseConfig::default()
        };
        let err = QueryRunner::new(config).run_sql("SELECT 1").await.unwrap_err();
        assert!(matches!(err, ToolingError::IoError(_)));
    }
}
