//! Template resolution and payload expansion.
//!
//! Two placeholder syntaxes are kept deliberately distinct: `{{.Name}}` is
//! early and resolved in a single pass against the assembled variable
//! mapping; `[[.Name]]` is late and consumed only by the payload
//! generator, after early resolution has already happened. The separation
//! lets a template be resolved once up-front, then cheaply re-substituted
//! per payload.

mod generators;
mod scripts;
mod template;
mod variables;

pub use generators::generate;
pub use scripts::run_script;
pub use template::{late_names, resolve, resolve_headers, resolve_list, resolve_late};
pub use variables::assemble;
