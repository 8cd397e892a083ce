//! Signature documents: loading them from YAML, resolving selectors into
//! concrete file sets, parsing the raw-HTTP alternate request form, and
//! instantiating concrete requests against an assembled variable mapping.

mod instantiate;
mod loader;
mod raw;
mod select;

pub use instantiate::instantiate;
pub use loader::{load, Error};
pub use raw::parse_raw;
pub use select::{apply_excludes, select_signs};
