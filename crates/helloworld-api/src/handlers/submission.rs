//! Greeting submission handlers
//!
//! Every outcome of the processor is rendered the same way: its messages go into the session
//! flash queue, then the visitor is redirected back to the form (303) or refused (403).

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Multipart, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use helloworld_core::models::{FlashMessage, FormData, Submission, SubmissionOutcome};
use helloworld_core::ErrorMetadata;
use helloworld_services::SubmissionRequest;
use serde::{Deserialize, Serialize};

use crate::constants::{CSRF_HEADER, FORM_PATH};
use crate::error::HttpAppError;
use crate::multipart::read_submission;
use crate::session::SessionContext;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct FormStateResponse {
    /// Data of the last rejected submission, shown once
    pub data: Option<FormData>,
    pub messages: Vec<FlashMessage>,
}

#[derive(Debug, Serialize)]
pub struct ForbiddenResponse {
    pub messages: Vec<FlashMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    #[serde(rename = "return")]
    pub return_to: Option<String>,
}

/// Only same-site absolute paths are accepted as redirect targets.
fn return_uri(requested: Option<&str>) -> String {
    match requested {
        Some(uri) if uri.starts_with('/') && !uri.starts_with("//") && !uri.contains('\\') => {
            uri.to_string()
        }
        _ => FORM_PATH.to_string(),
    }
}

fn redirect(location: &str) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

async fn render_outcome(
    state: &AppState,
    session: &SessionContext,
    outcome: SubmissionOutcome,
) -> Result<Response, HttpAppError> {
    let messages: Vec<FlashMessage> = outcome.messages().into_iter().cloned().collect();

    if let Some(error) = outcome.error() {
        tracing::debug!(code = error.error_code(), error = %error, "Submission rejected");
    }

    let response = match outcome.redirect_uri() {
        Some(location) => {
            state.flash.enqueue(session.session_id(), &messages).await?;
            redirect(location)
        }
        None => (
            StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::FORBIDDEN),
            Json(ForbiddenResponse { messages }),
        )
            .into_response(),
    };

    Ok(response)
}

/// Mint a CSRF token for the caller's session (creating the session if needed).
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Response, HttpAppError> {
    let token = state.processor.issue_token(&session.principal)?;
    Ok(session.apply(Json(TokenResponse { token }).into_response()))
}

/// Form state for rendering: stashed data of the last rejected attempt plus queued messages.
pub async fn form_state(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Response, HttpAppError> {
    let data = state.processor.load_form_data(&session.principal).await?;
    let messages = state.flash.drain(session.session_id()).await?;
    Ok(session.apply(Json(FormStateResponse { data, messages }).into_response()))
}

#[tracing::instrument(skip_all, fields(session_id = %session.session_id(), principal_id = session.principal.id))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let form = read_submission(multipart, state.config.upload_max_bytes).await?;

    let token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| form.token.clone());

    let request = SubmissionRequest {
        submission: Submission::new(form.fields.clone(), form.attachment.clone()),
        token,
        return_uri: return_uri(form.return_to.as_deref()),
    };

    let outcome = state.processor.handle(&session.principal, request).await?;
    // The spooled upload is removed once `form` drops, after the store has copied it.
    drop(form);

    let response = render_outcome(&state, &session, outcome).await?;
    Ok(session.apply(response))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    form: Result<Form<CancelForm>, FormRejection>,
) -> Result<Response, HttpAppError> {
    let requested = form.ok().and_then(|Form(f)| f.return_to);
    let outcome = state
        .processor
        .cancel(&session.principal, return_uri(requested.as_deref()))
        .await?;

    let response = render_outcome(&state, &session, outcome).await?;
    Ok(session.apply(response))
}
