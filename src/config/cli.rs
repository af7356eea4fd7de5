use crate::core::seed_injector::SeedVariant;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "faturix-tools")]
#[command(about = "Build and maintenance tools for the Faturix point of sale")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file (default: ./faturix-tools.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Dry run - transform and report without writing files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PathArgs {
    /// Override the input path
    #[arg(short, long)]
    pub input: Option<String>,

    /// Override the output path
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Strip session directives and the preamble from a raw dump
    Sanitize(PathArgs),

    /// Splice the seed-data block into a cleaned dump
    Seed {
        #[arg(long, default_value = "initial", value_parser = parse_variant)]
        variant: SeedVariant,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Turn ON CONFLICT upserts into IF NOT EXISTS blocks
    RewriteUpserts(PathArgs),

    /// Prefix table references with the configured schema
    QualifySchema(PathArgs),

    /// Render the icon set (input: SVG directory, output: generated directory)
    Icons(PathArgs),

    /// Print the effective configuration as TOML
    ShowConfig,
}

fn parse_variant(value: &str) -> Result<SeedVariant, String> {
    value.parse().map_err(|e: crate::utils::error::ToolingError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_after_subcommand_uses_defaults() {
        let cli = Cli::try_parse_from(["faturix-tools", "sanitize"]).unwrap();
        assert!(!cli.dry_run);
        match cli.command {
            Command::Sanitize(paths) => {
                assert!(paths.input.is_none());
                assert!(paths.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_seed_variant_and_global_flags() {
        let cli = Cli::try_parse_from([
            "faturix-tools",
            "seed",
            "--variant",
            "final",
            "--output",
            "out.sql",
            "--dry-run",
            "-v",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.verbose);
        match cli.command {
            Command::Seed { variant, paths } => {
                assert_eq!(variant, SeedVariant::Final);
                assert_eq!(paths.output.as_deref(), Some("out.sql"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_variant() {
        assert!(Cli::try_parse_from(["faturix-tools", "seed", "--variant", "x"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["faturix-tools"]).is_err());
    }
}
