//! releasebot webhook receiver.
//!
//! Binds an HTTP server with two endpoints:
//!
//! - `GET /health`: liveness probe, no side effects.
//! - `POST /webhook`: buffers the (bounded) body, then runs signature
//!   verification → event filtering → pipeline execution and maps the outcome
//!   to a status code and short reason.
//!
//! Every other method or path answers `404 Not Found`.
//!
//! ## Status codes
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | Run succeeded | 200 | `Webhook processed successfully` |
//! | Not actionable | 200 | `Event ignored` |
//! | Malformed body or signature header | 400 | `Bad Request` |
//! | Missing or wrong signature | 401 | `Unauthorized` |
//! | Body over the configured limit | 413 | `Payload Too Large` |
//! | Pipeline failure | 500 | `Internal Server Error` |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, header extraction and response mapping
//! live here. Verification and filtering come from [`pipeline`]; execution
//! from [`executor`].

pub mod handlers;
pub mod response;
pub mod router;
pub mod server;
pub mod state;

pub use response::WebhookResponse;
pub use router::build_router;
pub use server::{ListenerError, WebhookListener};
pub use state::AppState;

/// Header carrying the HMAC-SHA256 signature of the body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Header carrying the event type.
pub const EVENT_TYPE_HEADER: &str = "x-github-event";

/// Header carrying the platform's unique delivery identifier.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";
