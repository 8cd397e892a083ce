use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scan target, decomposed into the named parts that signature templates
/// reference as `{{.Host}}`, `{{.BaseURL}}` and friends.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub raw: String,
    pub scheme: String,
    pub domain: String,
    /// `domain` alone when the port is the scheme default, else `domain:port`.
    pub host: String,
    pub port: String,
    pub path: String,
    pub raw_query: String,
    pub url: String,
    pub base_url: String,
    /// Dotted suffix of `base_url`. Almost always a TLD-ish value such as
    /// `.com`; kept for compatibility with existing signatures.
    pub extension: String,
}

impl Target {
    /// Parse a raw target string. Inputs without a usable scheme are retried
    /// with an `https://` prefix, which also covers the misparse where the
    /// host is taken for the scheme (`example.com:8080/x`). Parsing never
    /// fails: unusable input yields a target carrying only `raw`.
    pub fn parse(raw: &str) -> Target {
        let mut target = Target {
            raw: raw.to_string(),
            ..Target::default()
        };
        if raw.is_empty() {
            return target;
        }

        let parsed = match url::Url::parse(raw) {
            Ok(u) if !u.scheme().contains('.') && u.has_host() => u,
            _ => match url::Url::parse(&format!("https://{raw}")) {
                Ok(u) => u,
                Err(_) => return target,
            },
        };

        target.scheme = parsed.scheme().to_string();
        target.domain = parsed.host_str().unwrap_or_default().to_string();
        target.path = parsed.path().to_string();
        target.raw_query = parsed.query().unwrap_or_default().to_string();
        target.port = match parsed.port() {
            Some(p) => p.to_string(),
            None if target.scheme == "https" => "443".to_string(),
            None => "80".to_string(),
        };

        let default_port = (target.scheme == "https" && target.port == "443")
            || (target.scheme == "http" && target.port == "80");
        target.host = if default_port {
            target.domain.clone()
        } else {
            format!("{}:{}", target.domain, target.port)
        };

        target.url = if !target.raw_query.is_empty() && default_port {
            format!(
                "{}://{}{}?{}",
                target.scheme, target.host, target.path, target.raw_query
            )
        } else if !default_port {
            format!(
                "{}://{}:{}{}?{}",
                target.scheme, target.domain, target.port, target.path, target.raw_query
            )
        } else {
            format!("{}://{}{}", target.scheme, target.host, target.path)
        };

        target.base_url = match parsed.port() {
            Some(p) => format!("{}://{}:{}", target.scheme, target.domain, p),
            None => format!("{}://{}", target.scheme, target.domain),
        };
        target.extension = extension_of(&target.base_url);
        target
    }

    /// Flatten into the ordered name → value mapping consumed by the
    /// template resolver. Keys match the names signatures use.
    pub fn variables(&self) -> IndexMap<String, String> {
        IndexMap::from([
            ("Raw".to_string(), self.raw.clone()),
            ("Scheme".to_string(), self.scheme.clone()),
            ("Domain".to_string(), self.domain.clone()),
            ("Host".to_string(), self.host.clone()),
            ("Port".to_string(), self.port.clone()),
            ("Path".to_string(), self.path.clone()),
            ("RawQuery".to_string(), self.raw_query.clone()),
            ("URL".to_string(), self.url.clone()),
            ("BaseURL".to_string(), self.base_url.clone()),
            ("Extension".to_string(), self.extension.clone()),
        ])
    }
}

// Dotted suffix of the final `/`-separated element, dot included.
fn extension_of(base: &str) -> String {
    let tail = base.rsplit('/').next().unwrap_or_default();
    match tail.rfind('.') {
        Some(idx) => tail[idx..].to_string(),
        None => String::new(),
    }
}
