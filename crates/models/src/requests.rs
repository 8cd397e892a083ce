use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One header entry. Headers travel as an ordered list of single-entry
/// maps so that duplicate names round-trip in author-defined order.
pub type Header = IndexMap<String, String>;

/// One request template of a signature, or the concrete request produced
/// from it by resolution and payload expansion.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Request {
    pub method: String,
    pub url: String,
    /// Legacy alias for `url`, consulted only when `url` is empty.
    pub path: String,
    pub body: String,
    pub headers: Vec<Header>,
    pub detections: Vec<String>,
    pub middlewares: Vec<String>,
    pub conclusions: Vec<String>,
    pub conditions: Vec<String>,
    pub generators: Vec<String>,
    /// Final encoding applied to substituted payload values: "url",
    /// "base64", or empty for none.
    pub encoding: String,
    pub redirect: bool,
    pub repeat: u32,
    /// Seconds; 0 inherits the global timeout.
    pub timeout: u64,
    /// Empty inherits the global proxy; "blank" explicitly disables it.
    pub proxy: String,
    /// Raw HTTP blob alternate form. Preserved verbatim after parsing.
    pub raw: String,
}

impl Request {
    /// Case-insensitive lookup across the ordered header list. Returns the
    /// first value carrying the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|entry| {
            entry
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

#[cfg(test)]
mod test {
    use super::Request;
    use indexmap::IndexMap;

    #[test]
    fn header_lookup_is_case_insensitive_and_ordered() {
        let req = Request {
            headers: vec![
                IndexMap::from([("X-Probe".to_string(), "one".to_string())]),
                IndexMap::from([("x-probe".to_string(), "two".to_string())]),
            ],
            ..Request::default()
        };
        assert_eq!(req.header("X-PROBE"), Some("one"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn yaml_defaults_fill_unset_fields() {
        let req: Request = serde_yaml::from_str("url: https://x/y").unwrap();
        assert_eq!(req.url, "https://x/y");
        assert_eq!(req.method, "");
        assert!(!req.redirect);
        assert_eq!(req.repeat, 0);
    }
}
