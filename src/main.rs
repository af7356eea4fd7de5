use clap::Parser;
use faturix_tools::config::{Cli, Command};
use faturix_tools::core::{Pipeline, PipelineReport};
use faturix_tools::utils::{logger, validation::Validate};
use faturix_tools::{
    DumpSanitizer, EtlEngine, IconRasterizer, LocalStorage, Result, SchemaQualifier,
    SeedInjector, ToolingConfig, ToolingError, UpsertRewriter,
};

struct Output {
    dry_run: bool,
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ToolingConfig::load(cli.config.as_deref())?;
    config.validate()?;
    tracing::debug!("Base directory: {}", config.base_dir());

    let output = Output {
        dry_run: cli.dry_run,
        json: cli.json,
    };
    let storage = LocalStorage::new(config.base_dir());

    match cli.command {
        Command::Sanitize(paths) => {
            let pipeline = DumpSanitizer::new(storage, config.sanitize.clone())
                .with_paths(paths.input, paths.output);
            run_pipeline(pipeline, &output).await
        }
        Command::Seed { variant, paths } => {
            let pipeline = SeedInjector::new(storage, config.seed.clone(), variant)
                .with_paths(paths.input, paths.output);
            run_pipeline(pipeline, &output).await
        }
        Command::RewriteUpserts(paths) => {
            let pipeline = UpsertRewriter::new(storage, config.rewrite.clone())
                .with_paths(paths.input, paths.output);
            run_pipeline(pipeline, &output).await
        }
        Command::QualifySchema(paths) => {
            let pipeline = SchemaQualifier::new(storage, config.qualify.clone())
                .with_paths(paths.input, paths.output);
            run_pipeline(pipeline, &output).await
        }
        Command::Icons(paths) => {
            let rasterizer = IconRasterizer::new(config.icons.clone(), config.base_dir())
                .with_dirs(paths.input, paths.output);
            run_icons(rasterizer, &output).await
        }
        Command::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run_pipeline<P: Pipeline>(pipeline: P, output: &Output) -> Result<()> {
    let engine = EtlEngine::new(pipeline);
    let report = if output.dry_run {
        engine.dry_run().await?
    } else {
        engine.run().await?
    };

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, output.dry_run);
    }
    Ok(())
}

fn print_report(report: &PipelineReport, dry_run: bool) {
    if dry_run {
        println!("🔍 DRY RUN - {}: nothing written", report.pipeline);
    } else {
        println!("✅ {} completed successfully!", report.pipeline);
        println!("📁 Output saved to: {}", report.output_path);
    }
    println!(
        "📊 Lines read: {}, skipped: {}, written: {}, substitutions: {}",
        report.stats.lines_read,
        report.stats.lines_skipped,
        report.stats.lines_written,
        report.stats.substitutions
    );
}

async fn run_icons(rasterizer: IconRasterizer, output: &Output) -> Result<()> {
    if output.dry_run {
        rasterizer.check_sources()?;
        println!(
            "🔍 DRY RUN - icon sources found in {}, output would go to {}",
            rasterizer.source_dir().display(),
            rasterizer.output_dir().display()
        );
        return Ok(());
    }

    // Rendering is CPU bound; keep it off the async workers.
    let report = tokio::task::spawn_blocking(move || rasterizer.run())
        .await
        .map_err(|e| ToolingError::ProcessingError {
            message: format!("icon task failed: {}", e),
        })??;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("✨ {} icon(s) generated", report.generated.len());
    if let Some(ico) = &report.ico {
        println!("🪟 {}", ico.display());
    }
    println!("📱 {} Android file(s) copied", report.android.len());
    for failure in &report.failed {
        println!("❌ {}", failure);
    }
    Ok(())
}
