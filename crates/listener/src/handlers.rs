//! Request handlers.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use pipeline::{
    filter_delivery, verify_signature, EventError, FilterOutcome, PipelineError, SignatureError,
    WebhookDelivery,
};
use secrecy::ExposeSecret;
use tracing::Instrument;

use crate::{AppState, WebhookResponse, DELIVERY_ID_HEADER, EVENT_TYPE_HEADER, SIGNATURE_HEADER};

/// GET /health - liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

/// Any unmatched method or path.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// POST /webhook - verify, filter and dispatch one delivery.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> WebhookResponse {
    let delivery_id = header_str(&headers, DELIVERY_ID_HEADER).unwrap_or("-").to_string();
    let span = tracing::info_span!("delivery", id = %delivery_id);

    async move {
        let body = match body {
            Ok(body) => body,
            Err(rejection) => return body_rejection(&rejection),
        };

        let delivery = WebhookDelivery {
            body: &body,
            signature: header_str(&headers, SIGNATURE_HEADER),
            event_type: header_str(&headers, EVENT_TYPE_HEADER),
        };
        dispatch(&state, delivery).await
    }
    .instrument(span)
    .await
}

/// Runs verifier → filter → executor for a buffered delivery.
pub async fn dispatch(state: &AppState, delivery: WebhookDelivery<'_>) -> WebhookResponse {
    let secret = state.config.webhook_secret().expose_secret().as_bytes();
    if let Err(err) = verify_signature(secret, delivery.body, delivery.signature) {
        tracing::warn!(reason = %err, "rejected delivery");
        return match err {
            SignatureError::Malformed => WebhookResponse::BadRequest,
            SignatureError::Missing | SignatureError::Mismatch => WebhookResponse::Unauthorized,
        };
    }

    let outcome = match filter_delivery(
        delivery.body,
        delivery.event_type,
        &state.config.target_repository,
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            log_event_error(&err);
            return WebhookResponse::BadRequest;
        }
    };

    let event = match outcome {
        FilterOutcome::Actionable(event) => event,
        FilterOutcome::Ignored(reason) => {
            if state.config.debug {
                tracing::info!(%reason, "ignoring event");
            }
            return WebhookResponse::Ignored;
        }
    };

    tracing::info!(
        repository = %event.repository,
        version = %event.version,
        "new release detected"
    );

    // The run proceeds on its own tracked task so a dropped connection cannot
    // cancel it halfway through the git steps, and shutdown waits for it.
    let executor = state.executor.clone();
    let handle = state
        .runs
        .spawn(async move { executor.execute(event).await }.in_current_span());

    match handle.await {
        Ok(Ok(report)) => {
            tracing::info!(run_id = %report.run_id, version = %report.version, "webhook processed");
            WebhookResponse::Processed
        }
        Ok(Err(err)) => {
            log_pipeline_error(&err);
            WebhookResponse::InternalError
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "pipeline task aborted");
            WebhookResponse::InternalError
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn body_rejection(rejection: &BytesRejection) -> WebhookResponse {
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            tracing::warn!("rejected oversized delivery");
            WebhookResponse::PayloadTooLarge
        }
        other => {
            tracing::error!(error = %other, "error receiving webhook");
            WebhookResponse::InternalError
        }
    }
}

fn log_event_error(err: &EventError) {
    tracing::warn!(error = %err, "malformed delivery");
}

fn log_pipeline_error(err: &PipelineError) {
    // The executor already logged the run outcome inside its span.
    tracing::debug!(error = %err, step = %err.step(), "responding with pipeline failure");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
