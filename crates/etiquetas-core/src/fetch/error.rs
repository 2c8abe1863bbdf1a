use thiserror::Error;

/// Failures talking to a webhook. The display strings surface directly in
/// the dashboards, hence the user-facing wording.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("recurso não encontrado: {0}")]
    NotFound(String),

    #[error("erro no servidor: {0}")]
    ServerError(String),

    #[error("resposta inesperada ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("erro de rede: {0}")]
    Network(#[from] reqwest::Error),

    #[error("resposta inválida: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid dragging whole HTML error pages
    /// into messages and logs.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = body
                .char_indices()
                .take_while(|(i, _)| *i < MAX_ERROR_BODY_LENGTH)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => FetchError::NotFound(truncated),
            500..=599 => FetchError::ServerError(truncated),
            code => FetchError::UnexpectedStatus {
                status: code,
                body: truncated,
            },
        }
    }
}
