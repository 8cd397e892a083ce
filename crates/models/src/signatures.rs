use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Request, Response};

/// How a signature's request templates expand into concrete requests.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum SignType {
    /// One concrete request per template. Also the reading of an empty or
    /// unrecognised `type` field.
    Single,
    /// Like `Single`, for signatures whose templates form an ordered chain.
    List,
    /// Templates fan out over the payload generator.
    Fuzz,
}

impl Default for SignType {
    fn default() -> Self {
        SignType::Single
    }
}

impl From<String> for SignType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => SignType::List,
            "fuzz" => SignType::Fuzz,
            _ => SignType::Single,
        }
    }
}

impl From<SignType> for String {
    fn from(t: SignType) -> Self {
        match t {
            SignType::Single => "single".to_string(),
            SignType::List => "list".to_string(),
            SignType::Fuzz => "fuzz".to_string(),
        }
    }
}

/// Descriptive block of a signature document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Info {
    pub name: String,
    pub category: String,
    pub risk: String,
    pub tech: String,
    pub os: String,
}

/// One declarative signature: the HTTP exchanges to perform against a
/// target and the predicates whose truth denotes a finding. Shared
/// read-only once loaded and bound.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Signature {
    pub id: String,
    #[serde(rename = "type")]
    pub sign_type: SignType,
    pub info: Info,
    /// Optional origin exchange performed once per target before the main
    /// requests, recorded for detections to reference.
    pub origin: Option<Request>,
    pub requests: Vec<Request>,
    pub payloads: Vec<String>,
    /// Ordered single-entry `{name: value}` maps. Values containing a
    /// function call are evaluated through the variable-script language.
    pub params: Vec<IndexMap<String, String>>,
    /// Named payload sources for `[[.name]]` placeholders beyond the
    /// default `payload` list.
    pub variables: Vec<IndexMap<String, String>>,
    /// The assembled variable mapping this signature was bound against.
    /// Populated at scan time, never from YAML.
    #[serde(skip)]
    pub target: IndexMap<String, String>,
}

impl Signature {
    /// Payload list with blank lines stripped. Duplicates are preserved;
    /// signature authors control uniqueness.
    pub fn clean_payloads(&self) -> Vec<String> {
        self.payloads
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Value of the named entry in `variables`, if declared.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find_map(|entry| entry.get(name).map(String::as_str))
    }
}

/// One worker-local unit of recorded traffic: the concrete request, its
/// response, and the origin exchange they may reference. The signature
/// back-reference is a shared read-only handle plus an id snapshot taken
/// at dispatch; signatures never point at records.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub origin_req: Request,
    pub origin_res: Response,
    pub request: Request,
    pub response: Response,
    /// Values captured by conclusion hooks (`ExtractRegex`).
    pub extracted: IndexMap<String, String>,
    pub scan_id: String,
    pub sign_id: String,
    pub sign: Arc<Signature>,
}
