use indexmap::IndexMap;
use models::{Request, SignType, Signature};
use resolver::{resolve, resolve_headers, resolve_list};

use crate::raw::parse_raw;

/// Instantiate one signature request template against an assembled
/// variable mapping, yielding the concrete requests to dispatch.
///
/// `single`/`list` templates emit one request when they carry a URL or
/// middlewares; `fuzz` templates run the payload generator. A non-empty
/// `raw` blob replaces the structured form: its parse supplies method,
/// URL, path, headers and body, while the template's resolved hook
/// expressions carry over.
pub fn instantiate(
    sign: &Signature,
    tmpl: &Request,
    vars: &IndexMap<String, String>,
) -> Vec<Request> {
    let mut req = tmpl.clone();
    let url_source = if tmpl.url.is_empty() {
        tmpl.path.as_str()
    } else {
        tmpl.url.as_str()
    };
    req.url = resolve(url_source, vars);
    req.body = resolve(&tmpl.body, vars);
    req.headers = resolve_headers(&tmpl.headers, vars);
    req.detections = resolve_list(&tmpl.detections, vars);
    req.middlewares = resolve_list(&tmpl.middlewares, vars);
    req.conclusions = resolve_list(&tmpl.conclusions, vars);
    req.conditions = resolve_list(&tmpl.conditions, vars);

    if !tmpl.raw.is_empty() {
        let blob = resolve(&tmpl.raw, vars);
        let parsed = parse_raw(&blob);
        req.method = parsed.method;
        req.url = parsed.url;
        req.path = parsed.path;
        req.headers = parsed.headers;
        req.body = parsed.body;
        req.raw = parsed.raw;
    }

    let emitted = match sign.sign_type {
        SignType::Single | SignType::List => {
            if req.url.is_empty() && req.middlewares.is_empty() {
                Vec::new()
            } else {
                vec![req]
            }
        }
        SignType::Fuzz => {
            if req.url.is_empty() {
                req.url = vars.get("URL").cloned().unwrap_or_default();
            }
            resolver::generate(&req, sign)
        }
    };

    apply_repeat(sign, tmpl.repeat, emitted)
}

// `repeat = n` multiplies the emitted list to n total copies. Non-fuzz
// signatures historically read the multiplier differently, so flag them.
fn apply_repeat(sign: &Signature, repeat: u32, emitted: Vec<Request>) -> Vec<Request> {
    if repeat == 0 || emitted.is_empty() {
        return emitted;
    }
    if sign.sign_type != SignType::Fuzz {
        tracing::warn!(
            signature = %sign.id,
            repeat,
            "repeat multiplies to `repeat` total copies for every signature type"
        );
    }
    let mut out = Vec::with_capacity(emitted.len() * repeat as usize);
    for _ in 0..repeat {
        out.extend(emitted.iter().cloned());
    }
    out
}

#[cfg(test)]
mod test {
    use super::instantiate;
    use indexmap::IndexMap;
    use models::{Request, SignType, Signature};

    fn vars() -> IndexMap<String, String> {
        IndexMap::from([
            ("BaseURL".to_string(), "https://example.com".to_string()),
            (
                "URL".to_string(),
                "https://example.com/a?b=1".to_string(),
            ),
        ])
    }

    fn template(url: &str) -> Request {
        Request {
            url: url.to_string(),
            detections: vec!["StatusCode(200)".to_string()],
            ..Request::default()
        }
    }

    #[test]
    fn single_template_emits_one_resolved_request() {
        let sign = Signature {
            id: "t-basic".to_string(),
            ..Signature::default()
        };
        let out = instantiate(&sign, &template("{{.BaseURL}}/admin"), &vars());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://example.com/admin");
        assert_eq!(out[0].detections, vec!["StatusCode(200)"]);
    }

    #[test]
    fn urlless_template_without_middlewares_emits_nothing() {
        let sign = Signature::default();
        assert!(instantiate(&sign, &Request::default(), &vars()).is_empty());
    }

    #[test]
    fn legacy_path_field_backfills_url() {
        let sign = Signature::default();
        let tmpl = Request {
            path: "{{.BaseURL}}/legacy".to_string(),
            ..Request::default()
        };
        let out = instantiate(&sign, &tmpl, &vars());
        assert_eq!(out[0].url, "https://example.com/legacy");
    }

    #[test]
    fn fuzz_template_fans_out_over_payloads() {
        let sign = Signature {
            sign_type: SignType::Fuzz,
            payloads: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..Signature::default()
        };
        let tmpl = template("{{.BaseURL}}/?q=[[.payload]]");
        let urls: Vec<String> = instantiate(&sign, &tmpl, &vars())
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/?q=a",
                "https://example.com/?q=b",
                "https://example.com/?q=c",
            ]
        );
    }

    #[test]
    fn repeat_multiplies_the_fan_out() {
        let sign = Signature {
            sign_type: SignType::Fuzz,
            payloads: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..Signature::default()
        };
        let mut tmpl = template("{{.BaseURL}}/?q=[[.payload]]");
        tmpl.repeat = 2;
        assert_eq!(instantiate(&sign, &tmpl, &vars()).len(), 6);
    }

    #[test]
    fn fuzz_without_url_falls_back_to_target_url() {
        let sign = Signature {
            sign_type: SignType::Fuzz,
            payloads: vec!["x".to_string()],
            ..Signature::default()
        };
        let tmpl = Request {
            body: "q=[[.payload]]".to_string(),
            ..Request::default()
        };
        let out = instantiate(&sign, &tmpl, &vars());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://example.com/a?b=1");
        assert_eq!(out[0].body, "q=x");
    }

    #[test]
    fn raw_blob_supplies_the_concrete_request() {
        let sign = Signature::default();
        let tmpl = Request {
            raw: "GET /probe HTTP/1.1\nHost: {{.Host}}\n\n".to_string(),
            detections: vec!["StatusCode(200)".to_string()],
            ..Request::default()
        };
        let mut vars = vars();
        vars.insert("Host".to_string(), "example.com".to_string());

        let out = instantiate(&sign, &tmpl, &vars);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].method, "GET");
        assert_eq!(out[0].url, "https://example.com/probe");
        assert_eq!(out[0].detections, vec!["StatusCode(200)"]);
    }
}
