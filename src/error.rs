use thiserror::Error;

/// Failures that terminate a single slate evaluation
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Transport, authentication, rate-limit or timeout failure talking to the
    /// completion service. Never retried.
    #[error("completion service error: {0}")]
    Service(String),
    /// The final candidate could not be turned into display values
    #[error("malformed evaluation result: {0}")]
    MalformedResult(#[from] MalformedResult),
}

#[derive(Debug, Error)]
pub enum MalformedResult {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is missing key `{0}`")]
    MissingKey(String),
}

impl From<async_openai::error::OpenAIError> for EvaluationError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        EvaluationError::Service(err.to_string())
    }
}
