#![cfg(unix)]

use faturix_tools::config::toml_config::DatabaseConfig;
use faturix_tools::{QueryRunner, ToolingError};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Writes an executable stand-in for the database client.
fn stub_client(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("psql");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn runner(client: &Path) -> QueryRunner {
    QueryRunner::new(DatabaseConfig {
        client_path: client.to_string_lossy().into_owned(),
        password: Some("segredo".to_string()),
        timeout_seconds: 5,
        ..DatabaseConfig::default()
    })
}

#[tokio::test]
async fn test_success_returns_trimmed_stdout() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(dir.path(), "printf '\\n  42  \\n\\n'");

    let out = runner(&client).run_sql("SELECT 42").await.unwrap();
    assert_eq!(out, "42");
}

#[tokio::test]
async fn test_passes_connection_arguments_and_password() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(dir.path(), r#"echo "$*"; echo "pw=$PGPASSWORD""#);

    let out = runner(&client)
        .run_sql("SELECT nome FROM usuarios")
        .await
        .unwrap();
    assert_eq!(
        out,
        "-U postgres -h 127.0.0.1 -d pdv_system -t -A -c SELECT nome FROM usuarios\npw=segredo"
    );
}

#[tokio::test]
async fn test_non_zero_exit_is_query_failed() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(
        dir.path(),
        "echo partial; echo 'relation \"x\" does not exist' >&2; exit 3",
    );

    match runner(&client).run_sql("SELECT * FROM x").await {
        Err(ToolingError::QueryFailed {
            code,
            stdout,
            stderr,
        }) => {
            assert_eq!(code, Some(3));
            assert_eq!(stdout, "partial\n");
            assert_eq!(stderr.trim(), "relation \"x\" does not exist");
        }
        other => panic!("expected QueryFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_client_times_out() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(dir.path(), "sleep 10");
    let runner = QueryRunner::new(DatabaseConfig {
        client_path: client.to_string_lossy().into_owned(),
        timeout_seconds: 1,
        ..DatabaseConfig::default()
    });

    let err = runner.run_sql("SELECT pg_sleep(10)").await.unwrap_err();
    assert!(matches!(err, ToolingError::Timeout { seconds: 1 }));
}

fn db_helper(dir: &Path, client: &Path, args: &[&str]) -> std::process::Output {
    let config = dir.join("faturix-tools.toml");
    fs::write(
        &config,
        format!("[database]\nclient_path = {:?}\n", client.to_string_lossy()),
    )
    .unwrap();

    Command::new(env!("CARGO_BIN_EXE_db_helper"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_db_helper_prints_result_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(dir.path(), "echo '  7  '");

    let out = db_helper(dir.path(), &client, &["SELECT COUNT(*) FROM setores"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "7\n");
}

#[test]
fn test_db_helper_reports_client_failure() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(dir.path(), "echo parcial; exit 2");

    let out = db_helper(dir.path(), &client, &["SELECT 1"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "ERRO: Erro desconhecido\nSTDOUT: parcial\n\nReturn code: 2\n"
    );
}

#[test]
fn test_db_helper_without_query_prints_usage() {
    let dir = TempDir::new().unwrap();
    let client = stub_client(dir.path(), "exit 0");

    let out = db_helper(dir.path(), &client, &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("Uso: db_helper"));
}

#[test]
fn test_db_helper_reports_missing_client_on_stderr() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-psql");

    let out = db_helper(dir.path(), &missing, &["SELECT 1"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.lines().any(|line| line.starts_with("ERRO: ")),
        "stderr was {:?}",
        stderr
    );
}
