//! Question → SQL under the schema contract

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{ChatBackend, ChatRequest};
use crate::schema;
use crate::LlmError;

/// Output budget for the generation call
pub const DEFAULT_SQL_MAX_TOKENS: u32 = 512;

/// Longest excerpt of a bad response kept in the error message
const MAX_EXCERPT_CHARS: usize = 200;

/// The `{"sql": ..., "error": ...}` object the model is asked to return
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlGeneration {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SqlGeneration {
    /// The statement to run, or `None` when the question is unanswerable
    pub fn sql(&self) -> Option<&str> {
        self.sql
            .as_deref()
            .map(str::trim)
            .filter(|sql| !sql.is_empty())
    }
}

pub struct SqlGenerator {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
    max_tokens: u32,
}

impl SqlGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            system_prompt: schema::sql_system_prompt(),
            max_tokens: DEFAULT_SQL_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Ask the model for a statement answering `question`
    ///
    /// No SQL validation happens here; an unparseable response is an error.
    pub async fn generate(&self, question: &str) -> Result<SqlGeneration, LlmError> {
        let request = ChatRequest::deterministic(
            self.system_prompt.as_str(),
            format!("Generate SQL for: {}", question),
            self.max_tokens,
        );

        let text = self.backend.complete(request).await?;
        debug!(response = %text, "SQL generation response");

        let generation = parse_generation(&text)?;
        match generation.sql() {
            Some(sql) => info!(%sql, "Generated SQL"),
            None => info!(error = ?generation.error, "Model reported question as unanswerable"),
        }
        Ok(generation)
    }
}

/// Pull the generation object out of free-form model text
///
/// Tried in order: a JSON object inside a fenced code block, then the span from
/// the first `{` to the last `}`.
pub fn parse_generation(text: &str) -> Result<SqlGeneration, LlmError> {
    let text = text.trim();

    for block in fenced_blocks(text) {
        match serde_json::from_str::<SqlGeneration>(block) {
            Ok(generation) => return Ok(generation),
            Err(e) => debug!(error = %e, "Fenced block is not a generation object"),
        }
    }

    if let Some(span) = brace_span(text) {
        match serde_json::from_str::<SqlGeneration>(span) {
            Ok(generation) => return Ok(generation),
            Err(e) => debug!(error = %e, "Brace-delimited span is not a generation object"),
        }
    }

    warn!(response = %text, "No JSON object found in SQL generation response");
    Err(LlmError::MalformedGenerationOutput(excerpt(text)))
}

/// Bodies of ``` fenced blocks that look like JSON objects, language tag removed
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split("```")
        .skip(1)
        .step_by(2)
        .map(|body| {
            let body = body.trim_start();
            body.strip_prefix("json")
                .or_else(|| body.strip_prefix("JSON"))
                .unwrap_or(body)
                .trim()
        })
        .filter(|body| body.starts_with('{'))
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > MAX_EXCERPT_CHARS {
        let head: String = text.chars().take(MAX_EXCERPT_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;

    #[test]
    fn test_parse_bare_json() {
        let generation =
            parse_generation(r#"{"sql": "SELECT num_trades FROM v_trade_summary", "error": null}"#)
                .unwrap();
        assert_eq!(generation.sql(), Some("SELECT num_trades FROM v_trade_summary"));
        assert!(generation.error.is_none());
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let text = "Here is the query:\n```json\n{\"sql\": \"SELECT ytd_pl FROM v_fund_summary\", \"error\": null}\n```\nLet me know!";
        let generation = parse_generation(text).unwrap();
        assert_eq!(generation.sql(), Some("SELECT ytd_pl FROM v_fund_summary"));
    }

    #[test]
    fn test_parse_skips_non_json_fence() {
        let text = "```sql\nSELECT 1\n```\n```\n{\"sql\": \"SELECT 2\", \"error\": null}\n```";
        assert_eq!(parse_generation(text).unwrap().sql(), Some("SELECT 2"));
    }

    #[test]
    fn test_parse_embedded_object() {
        let text = r#"Sure! {"sql": null, "error": "Cannot answer"} Hope that helps."#;
        let generation = parse_generation(text).unwrap();
        assert_eq!(generation.sql(), None);
        assert_eq!(generation.error.as_deref(), Some("Cannot answer"));
    }

    #[test]
    fn test_parse_missing_fields_default_to_none() {
        let generation = parse_generation("{}").unwrap();
        assert_eq!(generation, SqlGeneration::default());
    }

    #[test]
    fn test_blank_sql_is_unanswerable() {
        let generation = parse_generation(r#"{"sql": "   ", "error": null}"#).unwrap();
        assert_eq!(generation.sql(), None);
    }

    #[test]
    fn test_parse_without_json_fails() {
        let err = parse_generation("SELECT * FROM v_fund_summary").unwrap_err();
        assert!(matches!(err, LlmError::MalformedGenerationOutput(_)));

        let err = parse_generation("{not json at all}").unwrap_err();
        assert!(matches!(err, LlmError::MalformedGenerationOutput(_)));
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(500);
        assert_eq!(excerpt(&long).len(), MAX_EXCERPT_CHARS + 3);
    }

    #[tokio::test]
    async fn test_generate_sends_deterministic_prompt() {
        let backend = Arc::new(ScriptedBackend::replying(
            r#"{"sql": "SELECT total_market_value FROM v_fund_summary WHERE LOWER(PortfolioName)='fund abc'", "error": null}"#,
        ));
        let generator = SqlGenerator::new(backend.clone());

        let generation = generator
            .generate("What is the total market value of Fund ABC?")
            .await
            .unwrap();
        assert_eq!(
            generation.sql(),
            Some("SELECT total_market_value FROM v_fund_summary WHERE LOWER(PortfolioName)='fund abc'")
        );

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.0);
        assert_eq!(calls[0].max_tokens, DEFAULT_SQL_MAX_TOKENS);
        assert_eq!(
            calls[0].user,
            "Generate SQL for: What is the total market value of Fund ABC?"
        );
        assert!(calls[0].system.contains("v_fund_summary"));
    }

    #[tokio::test]
    async fn test_generate_propagates_backend_failure() {
        let backend = Arc::new(ScriptedBackend::failing("connection refused"));
        let generator = SqlGenerator::new(backend).with_max_tokens(64);

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_)));
    }
}
