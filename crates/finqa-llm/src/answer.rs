//! Execution result → natural-language answer

use std::sync::Arc;

use finqa_duck::ExecutionResult;
use serde_json::Value;
use tracing::{debug, info};

use crate::backend::{ChatBackend, ChatRequest};
use crate::schema;
use crate::LlmError;

/// Returned whenever the data layer could not produce rows
pub const NO_ANSWER: &str = "Sorry, cannot find the answer in the available data.";

/// What the model must say when the rows do not answer the question
pub const MODEL_NO_ANSWER: &str = "Sorry, cannot find the answer.";

pub const DEFAULT_ANSWER_MAX_TOKENS: u32 = 300;

pub struct AnswerSynthesizer {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            system_prompt: schema::answer_system_prompt(MODEL_NO_ANSWER),
            max_tokens: DEFAULT_ANSWER_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Turn `result` into the user-facing answer
    ///
    /// Failed executions and single-cell results never reach the model.
    pub async fn synthesize(
        &self,
        question: &str,
        result: &ExecutionResult,
    ) -> Result<String, LlmError> {
        let table = match result {
            Ok(table) => table,
            Err(e) => {
                debug!(reason = %e, "No data to answer from");
                return Ok(NO_ANSWER.to_string());
            }
        };

        if let Some(value) = table.scalar() {
            debug!(%value, "Single-value result, formatting directly");
            return Ok(format_scalar(value).unwrap_or_else(|| NO_ANSWER.to_string()));
        }

        let request = ChatRequest::deterministic(
            self.system_prompt.as_str(),
            format!("Question:\n{}\n\nData:\n{}", question, table.render()),
            self.max_tokens,
        );

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Synthesizing answer from result table"
        );
        let answer = self.backend.complete(request).await?;
        Ok(answer.trim().to_string())
    }
}

/// `"The answer is ..."` for a single cell; `None` for SQL NULL
pub fn format_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) => format!("The answer is {}", format_number(f)),
            None => format!("The answer is {}", n),
        }),
        Value::String(s) => Some(format!("The answer is {}", s)),
        other => Some(format!("The answer is {}", other)),
    }
}

/// Two decimals with comma thousands separators: `1234567.5` → `1,234,567.50`
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}
