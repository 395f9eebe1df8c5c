//! finqa HTTP server
//!
//! Answers natural-language questions about fund holdings and trades by
//! generating SQL with a hosted language model, running it read-only against
//! DuckDB, and phrasing the result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use finqa_core::Orchestrator;
use finqa_duck::QueryGuard;
use finqa_llm::{schema, AnswerSynthesizer, ChatBackend, OpenAiBackend, SqlGenerator};
use tracing::{info, warn};

mod config;
mod http;
mod logging;

use config::Config;

const CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets live in .env
    dotenvy::dotenv().ok();

    let config = Config::load_or_default(CONFIG_PATH)
        .with_context(|| format!("Failed to load {}", CONFIG_PATH))?;
    config.apply_logging_env();
    logging::init();

    let api_token = Config::get_api_token()?;
    info!(
        api_base = %config.llm.api_base,
        model = %config.llm.model,
        timeout_secs = config.llm.timeout_secs,
        "Language model backend configured"
    );
    let backend: Arc<dyn ChatBackend> = Arc::new(
        OpenAiBackend::new(
            &api_token,
            &config.llm.api_base,
            config.llm.model.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        )
        .context("Failed to create language model client")?,
    );

    let guard = QueryGuard::open(&config.database.path)
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    check_schema(&guard);

    let ttl = cache_ttl(config.cache.ttl_secs)?;
    let orchestrator = Orchestrator::new(
        SqlGenerator::new(backend.clone()).with_max_tokens(config.llm.sql_max_tokens),
        Arc::new(guard),
        AnswerSynthesizer::new(backend).with_max_tokens(config.llm.answer_max_tokens),
    )
    .with_cache_ttl(ttl);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, cache_ttl_secs = config.cache.ttl_secs, "finqa server listening");

    axum::serve(listener, http::router(Arc::new(orchestrator)))
        .await
        .context("Server error")?;

    Ok(())
}

fn cache_ttl(ttl_secs: i64) -> anyhow::Result<chrono::Duration> {
    chrono::Duration::try_seconds(ttl_secs)
        .with_context(|| format!("cache.ttl_secs out of range: {}", ttl_secs))
}

/// Warn for every relation the SQL prompt promises that the store lacks
fn check_schema(guard: &QueryGuard) {
    match guard.missing_relations(&schema::RELATIONS) {
        Ok(missing) if missing.is_empty() => {
            info!(relations = schema::RELATIONS.len(), "Schema contract satisfied");
        }
        Ok(missing) => {
            for relation in &missing {
                warn!(%relation, "Relation named in the SQL prompt is missing from the store");
            }
        }
        Err(e) => warn!(error = %e, "Could not inspect the store schema"),
    }
}
