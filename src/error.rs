use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::handlers::proxy::with_cors;
use crate::i18n::{self, Locale};

/// Failures of the `/api/*` forwarding route.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("backend unreachable: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("unsupported method: {0}")]
    Method(String),
    #[error("backend returned invalid status {0}")]
    UpstreamStatus(u16),
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Method(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Upstream(_) | ProxyError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ProxyError::Method(_) => self.to_string(),
            _ => "Failed to connect to backend server".to_string(),
        };
        with_cors(HttpResponse::build(self.status_code())).json(json!({ "error": message }))
    }
}

/// Failures seen by the REST client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response arrived.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The backend answered with a non-2xx status.
    #[error("backend error ({status}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Application { status: u16, message: Option<String> },
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text to show inline in the originating form or page.
    pub fn message(&self, locale: Locale) -> String {
        match self {
            ApiError::Application {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Application { message: None, .. } => i18n::generic_error(locale).to_string(),
            ApiError::Network(_) | ApiError::Decode(_) => {
                i18n::connection_error(locale).to_string()
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by the operator commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("local storage: {0}")]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("output encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

impl CliError {
    /// Text for the operator: backend failures use the same localized
    /// messages the pages show.
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            CliError::Api(e) => e.message(locale),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn application_errors_forward_the_backend_message() {
        let err = ApiError::Application {
            status: 404,
            message: Some("Bot tidak ditemukan".into()),
        };
        assert_eq!(err.message(Locale::En), "Bot tidak ditemukan");
        assert_eq!(err.status(), Some(404));

        let err = ApiError::Application {
            status: 500,
            message: None,
        };
        assert_eq!(err.message(Locale::Id), "Terjadi kesalahan");
    }

    #[test]
    fn decode_errors_read_as_connectivity_failures() {
        let err = ApiError::Decode("expected value".into());
        assert_eq!(err.message(Locale::Id), "Tidak dapat terhubung ke server");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn cli_errors_show_localized_api_messages() {
        let err = CliError::from(ApiError::Application {
            status: 500,
            message: None,
        });
        assert_eq!(err.user_message(Locale::En), "Something went wrong");
        assert_eq!(
            CliError::Invalid("Harga harus berupa angka".into()).user_message(Locale::En),
            "Harga harus berupa angka"
        );
    }

    #[actix_web::test]
    async fn upstream_status_error_renders_502_with_cors() {
        let resp = ProxyError::UpstreamStatus(1000).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Failed to connect to backend server");
    }
}
