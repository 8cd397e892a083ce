//! The HTTP sender: performs exactly one network exchange (plus retries)
//! for a concrete request, under the per-request and global policy for
//! TLS, timeout, proxy, headers, redirect and retry, and returns the
//! recorded Response.

mod agents;
mod beautify;
mod headers;
mod send;

pub use beautify::{beautify_request, beautify_response};
pub use headers::{parse_method, prepare_headers};
pub use send::{assemble_response, send};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid request method {0:?}")]
    InvalidMethod(String),
    #[error("invalid request URL {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
