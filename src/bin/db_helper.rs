use clap::Parser;
use faturix_tools::utils::{logger, validation::Validate};
use faturix_tools::{QueryRunner, ToolingConfig, ToolingError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "db_helper")]
#[command(about = "Run one SQL statement against the local POS database")]
struct Args {
    /// SQL to execute, e.g. 'SELECT * FROM tabela'
    query: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayHelp => {
            print!("{}", e);
            return;
        }
        Err(_) => {
            println!("Uso: db_helper 'SELECT * FROM tabela'");
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(args.verbose);

    let config = match ToolingConfig::load(args.config.as_deref()).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERRO: {}", e);
            std::process::exit(1);
        }
    };

    match QueryRunner::new(config.database).run_sql(&args.query).await {
        Ok(stdout) => println!("{}", stdout),
        Err(ToolingError::QueryFailed {
            code,
            stdout,
            stderr,
        }) => {
            let message = stderr.trim();
            let message = if message.is_empty() {
                "Erro desconhecido"
            } else {
                message
            };
            println!("ERRO: {}", message);
            println!("STDOUT: {}", stdout);
            match code {
                Some(code) => println!("Return code: {}", code),
                None => println!("Return code: terminated by signal"),
            }
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Query not executed: {}", e);
            eprintln!("ERRO: {}", e);
            std::process::exit(1);
        }
    }
}
