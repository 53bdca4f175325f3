//! HTTP route handlers for the WhatsGPT web surface.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tracing::info;

use crate::bot::bulk;
use crate::chat::qr;

use super::error::AppError;
use super::pages;
use super::state::AppState;

/// Multipart field carrying the contact list.
const FILE_FIELD: &str = "csvFile";
/// Multipart field carrying the message template.
const MESSAGE_FIELD: &str = "initialMessage";

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();
    Router::new()
        .route("/health", get(health_check))
        .route("/submit", post(submit))
        .route("/authenticate/{phone_number}/{prompt}", get(authenticate))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::disable()),
        )
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "whatsgpt",
        "version": env!("CARGO_PKG_VERSION"),
        "whatsapp_ready": state.session.is_ready(),
    }))
}

/// Landing page form.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    /// Prompt typed on the landing page.
    pub message: String,
    /// Phone number typed on the landing page.
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

/// Forward the landing form to the pairing view.
async fn submit(Form(form): Form<SubmitForm>) -> Redirect {
    Redirect::to(&format!(
        "/authenticate/{}/{}",
        urlencoding::encode(&form.phone_number),
        urlencoding::encode(&form.message)
    ))
}

/// Pairing view. Both path parameters are accepted and ignored.
async fn authenticate(
    State(state): State<Arc<AppState>>,
    Path((_phone_number, _prompt)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    if state.session.is_ready() {
        return Ok(Html(pages::already_paired()).into_response());
    }

    match state.session.wait_for_pairing_code(state.pairing_timeout).await {
        Some(code) => {
            let src = qr::to_data_url(&code)?;
            Ok(Html(pages::pairing(&src)).into_response())
        }
        None => {
            info!(timeout = ?state.pairing_timeout, "No pairing code before deadline");
            Ok((
                StatusCode::GATEWAY_TIMEOUT,
                Html(pages::pairing_timeout(uri.path())),
            )
                .into_response())
        }
    }
}

/// Bulk upload: decode the contact list and fan out the opening message.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut file: Option<Vec<u8>> = None;
    let mut template: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let named = field.file_name().is_some_and(|n| !n.is_empty());
                let bytes = field.bytes().await?;
                if named || !bytes.is_empty() {
                    file = Some(bytes.to_vec());
                }
            }
            MESSAGE_FIELD => template = Some(field.text().await?),
            _ => {}
        }
    }

    let (Some(file), Some(template)) = (file, template.filter(|t| !t.is_empty())) else {
        return Err(AppError::MissingUploadInput);
    };

    let upload_dir = state.upload_dir.clone();
    let contacts = tokio::task::spawn_blocking(move || bulk::decode_upload(&upload_dir, &file))
        .await
        .map_err(|e| AppError::Internal(format!("upload decoding task failed: {e}")))??;

    info!(rows = contacts.len(), "Contact list decoded");
    let report = state.intake.fan_out(&contacts, &template).await;
    Ok(Html(pages::upload_summary(&report)))
}
