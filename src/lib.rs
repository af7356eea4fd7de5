pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
pub use config::ToolingConfig;
pub use core::{
    etl::EtlEngine, icons::IconRasterizer, query_runner::QueryRunner, sanitizer::DumpSanitizer,
    schema_qualifier::SchemaQualifier, seed_injector::SeedInjector,
    upsert_rewriter::UpsertRewriter,
};
pub use utils::error::{Result, ToolingError};
