use serde::{Deserialize, Serialize};

use crate::Header;

/// A recorded HTTP response. `length` counts status-line-free header lines
/// plus body bytes; `beautify` is the canonical text rendering and is
/// deterministic given the other fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Response {
    pub status: String,
    pub status_code: u16,
    pub headers: Vec<Header>,
    pub body: String,
    /// Seconds.
    pub response_time: f64,
    pub length: usize,
    pub beautify: String,
}

impl Response {
    /// True once a middleware or the sender has populated this response.
    pub fn is_populated(&self) -> bool {
        self.status_code != 0
    }
}
