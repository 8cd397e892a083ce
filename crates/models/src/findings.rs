use indexmap::IndexMap;
use serde::Serialize;

use crate::{Request, Response};

/// A matched signature against a target: append-only once emitted, owned
/// by the finding sink.
#[derive(Serialize, Debug, Clone)]
pub struct Finding {
    pub scan_id: String,
    pub signature_id: String,
    pub category: String,
    pub risk: String,
    pub request: Request,
    pub response: Response,
    /// The resolved detection expression(s) that held.
    pub matched_detection: String,
    pub vuln_url: String,
}

impl Finding {
    /// Flatten the reportable fields for template-driven output such as
    /// `--quiet-format '{{.VulnURL}}'`.
    pub fn variables(&self) -> IndexMap<String, String> {
        IndexMap::from([
            ("ScanID".to_string(), self.scan_id.clone()),
            ("SignID".to_string(), self.signature_id.clone()),
            ("Category".to_string(), self.category.clone()),
            ("Risk".to_string(), self.risk.clone()),
            ("VulnURL".to_string(), self.vuln_url.clone()),
            (
                "StatusCode".to_string(),
                self.response.status_code.to_string(),
            ),
        ])
    }
}
