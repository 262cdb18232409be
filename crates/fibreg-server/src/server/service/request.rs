use crate::server::service::response::ApiError;
use fibreg::{Algorithm, SequenceId};
use serde::Deserialize;

/// Query string of `/fib/{algo}`.
///
/// `input` is kept as text so that a malformed number gets the same message as
/// an out-of-range one.
#[derive(Debug, Default, Deserialize)]
pub struct SequenceQuery {
    pub input: Option<String>,
}

/// Accepts only the wire names `iterate`, `recursive` and `math`.
pub fn parse_algorithm(raw: &str) -> Result<Algorithm, ApiError> {
    Algorithm::ALL
        .into_iter()
        .find(|algorithm| algorithm.name() == raw)
        .ok_or_else(|| ApiError::InvalidAlgorithm(raw.to_string()))
}

/// Accepts `1 <= input < max_input`.
pub fn parse_input(raw: Option<&str>, max_input: u64) -> Result<u64, ApiError> {
    raw.and_then(|raw| raw.parse::<u64>().ok())
        .filter(|&input| input >= 1 && input < max_input)
        .ok_or(ApiError::InvalidInput { max: max_input })
}

/// Accepts any id `>= 1`. Whether it exists is decided by the lookup.
pub fn parse_id(raw: &str) -> Result<SequenceId, ApiError> {
    raw.parse::<u64>()
        .ok()
        .filter(|&id| id >= 1)
        .map(SequenceId::new)
        .ok_or(ApiError::InvalidId)
}
