//! End-to-end question answering

use std::sync::Arc;

use chrono::Duration;
use finqa_duck::{ExecutionResult, QueryGuard};
use finqa_llm::{AnswerSynthesizer, ChatBackend, SqlGenerator, NO_ANSWER};
use tracing::{debug, info, instrument};

use crate::cache::ResponseCache;
use crate::PipelineError;

/// One pipeline instance, shared by every request
///
/// Concurrent misses for the same question each run the full pipeline; the
/// last one to finish overwrites the cache entry.
pub struct Orchestrator {
    sql_generator: SqlGenerator,
    guard: Arc<QueryGuard>,
    synthesizer: AnswerSynthesizer,
    cache: ResponseCache,
}

impl Orchestrator {
    pub fn new(
        sql_generator: SqlGenerator,
        guard: Arc<QueryGuard>,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            sql_generator,
            guard,
            synthesizer,
            cache: ResponseCache::new(),
        }
    }

    /// Both language-model stages on the same backend with default output budgets
    pub fn from_backend(backend: Arc<dyn ChatBackend>, guard: Arc<QueryGuard>) -> Self {
        Self::new(
            SqlGenerator::new(backend.clone()),
            guard,
            AnswerSynthesizer::new(backend),
        )
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::with_ttl(ttl);
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn guard(&self) -> &QueryGuard {
        &self.guard
    }

    /// Answer one question
    ///
    /// Only generation-output and backend failures are returned as errors.
    /// Unanswerable questions, rejected statements and failed queries all come
    /// back as [`NO_ANSWER`] and are not cached.
    #[instrument(skip(self))]
    pub async fn answer(&self, question: &str) -> Result<String, PipelineError> {
        if let Some(entry) = self.cache.lookup(question) {
            info!(key = %entry.key, "Cache hit");
            return Ok(entry.answer);
        }
        debug!("Cache miss");

        let generation = self
            .sql_generator
            .generate(question)
            .await
            .map_err(PipelineError::Generation)?;

        let Some(sql) = generation.sql() else {
            info!("No answerable query for question");
            return Ok(NO_ANSWER.to_string());
        };

        let result = self.execute(sql).await?;
        if let Err(e) = &result {
            info!(reason = %e, rejected = e.is_rejection(), "Execution produced no data");
        }

        let answer = self
            .synthesizer
            .synthesize(question, &result)
            .await
            .map_err(PipelineError::Synthesis)?;

        if result.is_ok() && answer != NO_ANSWER {
            let entry = self.cache.store(question, &answer);
            debug!(key = %entry.key, "Cached answer");
        }

        Ok(answer)
    }

    /// Run the statement on the blocking pool; the DuckDB call is synchronous
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, PipelineError> {
        let guard = Arc::clone(&self.guard);
        let sql = sql.to_string();
        Ok(tokio::task::spawn_blocking(move || guard.execute(&sql)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finqa_duck::fixtures;
    use finqa_llm::testing::ScriptedBackend;

    #[tokio::test]
    async fn test_null_sql_answers_with_apology() {
        let backend = Arc::new(ScriptedBackend::replying(
            r#"{"sql": null, "error": "Cannot answer"}"#,
        ));
        let guard = Arc::new(QueryGuard::from_connection(
            fixtures::seeded_connection().unwrap(),
        ));
        let orchestrator = Orchestrator::from_backend(backend.clone(), guard);

        let answer = orchestrator.answer("What is the weather?").await.unwrap();
        assert_eq!(answer, "Sorry, cannot find the answer in the available data.");
        assert_eq!(orchestrator.guard().queries_executed(), 0);
        assert_eq!(backend.call_count(), 1);
        assert!(orchestrator.cache().is_empty());
    }
}
