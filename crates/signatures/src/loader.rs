use std::fs;
use std::path::{Path, PathBuf};

use models::Signature;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read signature file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed signature document {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("signature document {path} has no id")]
    MissingId { path: PathBuf },
}

/// Load one signature document and fill its defaults: category from the id
/// prefix before the first `-` (or the whole id), name from the id, risk
/// `Potential`. Detection-expression syntax is not validated here; that is
/// the evaluator's concern.
pub fn load(path: &Path) -> Result<Signature, Error> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut sign: Signature = serde_yaml::from_str(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if sign.id.is_empty() {
        return Err(Error::MissingId {
            path: path.to_path_buf(),
        });
    }
    if sign.info.category.is_empty() {
        sign.info.category = sign
            .id
            .split('-')
            .next()
            .unwrap_or(sign.id.as_str())
            .to_string();
    }
    if sign.info.name.is_empty() {
        sign.info.name = sign.id.clone();
    }
    if sign.info.risk.is_empty() {
        sign.info.risk = "Potential".to_string();
    }
    Ok(sign)
}

#[cfg(test)]
mod test {
    use super::{load, Error};
    use std::io::Write;

    fn write_sign(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_fill_after_load() {
        let file = write_sign(
            r#"
id: sqli-time-based
requests:
  - url: "{{.BaseURL}}/q"
"#,
        );
        let sign = load(file.path()).unwrap();
        assert_eq!(sign.info.category, "sqli");
        assert_eq!(sign.info.name, "sqli-time-based");
        assert_eq!(sign.info.risk, "Potential");
    }

    #[test]
    fn category_falls_back_to_whole_id() {
        let file = write_sign("id: probe\n");
        assert_eq!(load(file.path()).unwrap().info.category, "probe");
    }

    #[test]
    fn explicit_info_wins_over_defaults() {
        let file = write_sign(
            r#"
id: xss-reflected
info:
  name: Reflected XSS
  risk: High
"#,
        );
        let sign = load(file.path()).unwrap();
        assert_eq!(sign.info.name, "Reflected XSS");
        assert_eq!(sign.info.risk, "High");
        assert_eq!(sign.info.category, "xss");
    }

    #[test]
    fn missing_id_is_a_load_error() {
        let file = write_sign("info:\n  name: nameless\n");
        assert!(matches!(
            load(file.path()),
            Err(Error::MissingId { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_load_error() {
        let file = write_sign(":\t not yaml [");
        assert!(matches!(load(file.path()), Err(Error::Parse { .. })));
    }
}
