use crivo_core::AnalysisResult;
use tracing::warn;

use crate::extract::extract_json_payload;
use crate::llm::{ModelError, ReviewModel};
use crate::prompt::truncate_chars;

const PARSE_FAILURE_SUMMARY: &str = "Erro ao processar review automático";

/// Characters of an unparseable reply kept in the log.
const LOGGED_REPLY_CHARS: usize = 500;

/// Why an analysis produced no structured result.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The model request failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The reply did not contain a valid result object.
    #[error("failed to parse model reply: {source}")]
    Parse {
        /// Underlying JSON error.
        source: serde_json::Error,
        /// The text that failed to parse.
        payload: String,
    },
}

impl AnalysisError {
    /// The result used in place of a real analysis after this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use crivo_review::analyze::AnalysisError;
    /// use crivo_review::llm::ModelError;
    ///
    /// let err = AnalysisError::Model(ModelError::Transport("connection reset".into()));
    /// let fallback = err.fallback();
    /// assert!(fallback.summary.contains("connection reset"));
    /// assert!(fallback.issues.is_empty());
    /// ```
    pub fn fallback(&self) -> AnalysisResult {
        match self {
            AnalysisError::Model(e) => AnalysisResult::empty(format!("Erro na análise: {e}")),
            AnalysisError::Parse { .. } => AnalysisResult::empty(PARSE_FAILURE_SUMMARY),
        }
    }
}

/// Parse a model reply into an [`AnalysisResult`].
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] when the extracted payload is not a
/// valid result object.
pub fn parse_reply(reply: &str) -> Result<AnalysisResult, AnalysisError> {
    let payload = extract_json_payload(reply);
    serde_json::from_str(payload).map_err(|source| AnalysisError::Parse {
        source,
        payload: payload.to_string(),
    })
}

/// Send `prompt` to `model` once and parse the reply.
///
/// # Errors
///
/// Returns [`AnalysisError::Model`] on request failure and
/// [`AnalysisError::Parse`] on an unparseable reply.
pub async fn try_analyze<M>(model: &M, prompt: &str) -> Result<AnalysisResult, AnalysisError>
where
    M: ReviewModel + ?Sized,
{
    let reply = model.complete(prompt).await?;
    parse_reply(&reply)
}

/// Like [`try_analyze`], but degrades every failure to a fallback result
/// with no issues and an explanatory summary.
pub async fn analyze<M>(model: &M, prompt: &str) -> AnalysisResult
where
    M: ReviewModel + ?Sized,
{
    match try_analyze(model, prompt).await {
        Ok(result) => result,
        Err(err) => {
            match &err {
                AnalysisError::Model(e) => warn!(error = %e, "model request failed"),
                AnalysisError::Parse { source, payload } => warn!(
                    error = %source,
                    reply = truncate_chars(payload, LOGGED_REPLY_CHARS),
                    "could not parse model reply"
                ),
            }
            err.fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crivo_core::Severity;
    use reqwest::StatusCode;

    struct Canned(Result<&'static str, fn() -> ModelError>);

    impl Canned {
        fn reply(text: &'static str) -> Self {
            Canned(Ok(text))
        }

        fn error(make: fn() -> ModelError) -> Self {
            Canned(Err(make))
        }
    }

    #[async_trait]
    impl ReviewModel for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn fenced_reply_is_parsed() {
        let model = Canned::reply("Review:\n```json\n{\"summary\":\"ok\",\"high_count\":1,\"issues\":[{\"path\":\"a.ts\",\"line\":10,\"severity\":\"HIGH\",\"category\":\"Security\",\"title\":\"X\",\"description\":\"Y\"}]}\n```");
        let result = analyze(&model, "prompt").await;
        assert_eq!(result.summary, "ok");
        assert_eq!(result.high_count, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity_level(), Some(Severity::High));
    }

    #[tokio::test]
    async fn prose_reply_falls_back() {
        let model = Canned::reply("O código parece bom, sem problemas.");
        let result = analyze(&model, "prompt").await;
        assert_eq!(result.summary, PARSE_FAILURE_SUMMARY);
        assert!(result.issues.is_empty());
        assert_eq!(result.critical_count, 0);
    }

    #[tokio::test]
    async fn parse_error_keeps_payload() {
        let model = Canned::reply("```json\n{\"issues\": [\n```");
        let err = try_analyze(&model, "prompt").await.unwrap_err();
        match err {
            AnalysisError::Parse { payload, .. } => assert_eq!(payload, "{\"issues\": ["),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn transport_error_is_embedded_in_summary() {
        let model = Canned::error(|| ModelError::Transport("dns error: no such host".into()));
        let result = analyze(&model, "prompt").await;
        assert!(result.summary.starts_with("Erro na análise: "));
        assert!(result.summary.contains("dns error: no such host"));
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn rate_limit_is_model_error() {
        let model = Canned::error(|| {
            ModelError::from_status(StatusCode::TOO_MANY_REQUESTS, "overloaded".into())
        });
        let err = try_analyze(&model, "prompt").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Model(ModelError::RateLimited(_))));
        assert!(err.fallback().summary.contains("overloaded"));
    }

    #[test]
    fn non_object_reply_is_parse_error() {
        assert!(matches!(parse_reply("[1, 2, 3]"), Err(AnalysisError::Parse { .. })));
    }
}
