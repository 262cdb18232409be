//! HTTP surface of the registry.
//!
//! ## Structure
//!
//! - [`handler`] - axum handlers and the [`router`] that wires them.
//! - [`request`] - validation of path and query parameters.
//! - [`response`] - JSON bodies and the [`ApiError`](response::ApiError)
//!   mapping to status codes.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::router;

use fibreg::Dispatcher;
use tokio_util::sync::CancellationToken;

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Exclusive upper bound on accepted inputs.
    pub max_input: u64,
    /// Cancelled by `/shutdown` to trigger the same path as a signal.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, max_input: u64, shutdown: CancellationToken) -> Self {
        Self {
            dispatcher,
            max_input,
            shutdown,
        }
    }
}
