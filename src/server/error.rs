//! Handler errors and their HTTP mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qrcode::types::QrError;
use tracing::error;

use crate::bot::IntakeError;

/// Body of the 400 returned when the upload form is incomplete.
pub const MISSING_UPLOAD_INPUT: &str = "Please provide both CSV file and initial message";

/// Error returned by route handlers.
#[derive(Debug)]
pub enum AppError {
    /// The upload lacked the contact list or the initial message.
    MissingUploadInput,
    /// The contact list could not be spooled or decoded.
    Intake(IntakeError),
    /// The multipart body was malformed.
    Multipart(MultipartError),
    /// The pairing code could not be rendered.
    Qr(QrError),
    /// Anything else.
    Internal(String),
}

impl From<IntakeError> for AppError {
    fn from(e: IntakeError) -> Self {
        Self::Intake(e)
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        Self::Multipart(e)
    }
}

impl From<QrError> for AppError {
    fn from(e: QrError) -> Self {
        Self::Qr(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingUploadInput => (StatusCode::BAD_REQUEST, MISSING_UPLOAD_INPUT.to_string()),
            Self::Intake(IntakeError::Csv(err)) => (
                StatusCode::BAD_REQUEST,
                format!("Could not read contact list: {err}"),
            ),
            Self::Intake(IntakeError::Io(err)) => {
                error!(%err, "Upload spooling failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error occurred".to_string())
            }
            Self::Multipart(err) => (err.status(), err.body_text()),
            Self::Qr(err) => {
                error!(%err, "Pairing code rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error occurred".to_string())
            }
            Self::Internal(detail) => {
                error!(%detail, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error occurred".to_string())
            }
        };
        (status, message).into_response()
    }
}
