use thiserror::Error;

/// Recoverable insertion failures. The merge logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("section id=\"{0}\" not found")]
    SectionNotFound(String),

    #[error("no card grid after section id=\"{0}\"")]
    GridNotFound(String),

    #[error("card grid of section id=\"{0}\" has no closing '>'")]
    GridTagUnterminated(String),

    #[error("navigation anchor href=\"#{0}\" not found")]
    NavAnchorNotFound(String),

    #[error("navigation anchor href=\"#{0}\" has no closing </a>")]
    NavAnchorUnterminated(String),

    #[error("sentinel <div id=\"no-results\" not found")]
    SentinelNotFound,
}

/// Failures of the video listing request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// `body` is the response pretty-printed with its original key order.
    #[error("API returned code {code:?}")]
    Api { code: Option<i64>, body: String },
}

impl FetchError {
    /// Text printed in place of the video array.
    pub fn output(&self) -> String {
        match self {
            FetchError::Api { body, .. } => body.clone(),
            other => crate::videos::error_object(&other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prints_response_body() {
        let body = "{\n  \"code\": -352,\n  \"message\": \"-352\"\n}".to_string();
        let err = FetchError::Api { code: Some(-352), body: body.clone() };
        assert_eq!(err.output(), body);
        assert_eq!(err.to_string(), "API returned code Some(-352)");
    }

    #[test]
    fn test_decode_error_prints_error_object() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        let printed: serde_json::Value = serde_json::from_str(&err.output()).unwrap();
        let message = printed["error"].as_str().unwrap();
        assert!(message.starts_with("invalid response body"));
    }
}
