use axum::http::StatusCode;
use ble_core::service::error::{ErrorCode, ErrorKind, ServiceError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponseRestDTO {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Cause>,
    #[serde(rename = "partialResult", skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<serde_json::Value>,
}

impl ErrorResponseRestDTO {
    pub fn hide_cause(mut self, hide: bool) -> ErrorResponseRestDTO {
        if hide {
            self.cause = None;
        }

        self
    }

    pub fn status(&self) -> StatusCode {
        match self.code.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Range | ErrorKind::NotConnected | ErrorKind::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Unavailable | ErrorKind::ResourceExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorKind::EngineFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Cause {
    pub message: String,
}

impl Cause {
    pub fn with_message_from_error(error: &impl std::error::Error) -> Cause {
        Cause {
            message: error.to_string(),
        }
    }
}

impl From<&ServiceError> for ErrorResponseRestDTO {
    fn from(error: &ServiceError) -> Self {
        let code = error.error_code();

        Self {
            code,
            message: code.msg().to_string(),
            cause: Some(Cause::with_message_from_error(error)),
            partial_result: error.partial_result().cloned(),
        }
    }
}
