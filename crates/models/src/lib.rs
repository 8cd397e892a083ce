//! Data model shared by every stage of the scanner: parsed targets,
//! signature documents, request templates, recorded responses, and the
//! findings they produce.

mod findings;
mod options;
mod requests;
mod responses;
mod signatures;
mod targets;

pub use findings::Finding;
pub use options::Options;
pub use requests::{Header, Request};
pub use responses::Response;
pub use signatures::{Info, Record, SignType, Signature};
pub use targets::Target;
