use indexmap::IndexMap;
use models::Record;
use sender::beautify_response;

/// Run the request's middleware hooks before sending. A middleware may
/// mutate the request or pre-populate the response; once a response
/// carries a non-zero status the sender is skipped for this record.
pub fn apply_middlewares(record: &mut Record) {
    let middlewares = record.request.middlewares.clone();
    for raw in &middlewares {
        let expr = match dsl::parse(raw) {
            Ok(expr) => expr,
            Err(err) => {
                tracing::warn!(middleware = %raw, error = %err, "unparseable middleware");
                continue;
            }
        };
        let Some((name, args)) = expr.as_call() else {
            tracing::warn!(middleware = %raw, "middleware must be a single call");
            continue;
        };

        match name {
            "SetMethod" => {
                record.request.method = args
                    .first()
                    .map(|a| a.as_str().to_ascii_uppercase())
                    .unwrap_or_default();
            }
            "SetHeader" => {
                let name = args.first().map(|a| a.as_str()).unwrap_or_default();
                let value = args.get(1).map(|a| a.as_str()).unwrap_or_default();
                set_header(record, &name, &value);
            }
            "SetBody" => {
                record.request.body = args.first().map(|a| a.as_str()).unwrap_or_default();
            }
            "StaticResponse" => {
                let code = args
                    .first()
                    .and_then(|a| a.as_int())
                    .unwrap_or(200)
                    .clamp(100, 599) as u16;
                let body = args.get(1).map(|a| a.as_str()).unwrap_or_default();
                record.response.status_code = code;
                record.response.status = format!("{code} HTTP/1.1");
                record.response.length = body.len();
                record.response.body = body;
                record.response.beautify = beautify_response(&record.response);
            }
            other => tracing::warn!(middleware = other, "unknown middleware"),
        }
    }
}

// Replace the first header carrying the name (case-insensitive), else
// append a new entry.
fn set_header(record: &mut Record, name: &str, value: &str) {
    for header in &mut record.request.headers {
        let existing = header
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned();
        if let Some(key) = existing {
            header.insert(key, value.to_string());
            return;
        }
    }
    record
        .request
        .headers
        .push(IndexMap::from([(name.to_string(), value.to_string())]));
}

#[cfg(test)]
mod test {
    use super::apply_middlewares;
    use indexmap::IndexMap;
    use models::{Record, Request};

    fn record(middlewares: &[&str]) -> Record {
        Record {
            request: Request {
                url: "https://x/y".to_string(),
                middlewares: middlewares.iter().map(|m| m.to_string()).collect(),
                ..Request::default()
            },
            ..Record::default()
        }
    }

    #[test]
    fn static_response_populates_and_marks_the_record() {
        let mut record = record(&[r#"StaticResponse(200, "root:x:0:0")"#]);
        apply_middlewares(&mut record);

        assert!(record.response.is_populated());
        assert_eq!(record.response.status_code, 200);
        assert_eq!(record.response.body, "root:x:0:0");
        assert!(record.response.beautify.contains("root:x:0:0"));
    }

    #[test]
    fn request_mutators() {
        let mut record = record(&[
            r#"SetMethod("post")"#,
            r#"SetHeader("X-Probe", "1")"#,
            r#"SetBody("a=1")"#,
        ]);
        apply_middlewares(&mut record);

        assert_eq!(record.request.method, "POST");
        assert_eq!(record.request.header("x-probe"), Some("1"));
        assert_eq!(record.request.body, "a=1");
        assert!(!record.response.is_populated());
    }

    #[test]
    fn set_header_replaces_in_place() {
        let mut rec = record(&[r#"SetHeader("cookie", "b=2")"#]);
        rec.request.headers = vec![IndexMap::from([(
            "Cookie".to_string(),
            "a=1".to_string(),
        )])];
        apply_middlewares(&mut rec);

        assert_eq!(rec.request.headers.len(), 1);
        assert_eq!(rec.request.header("Cookie"), Some("b=2"));
    }

    #[test]
    fn broken_middlewares_are_skipped() {
        let mut record = record(&["SetMethod(", "Unknown(1)"]);
        apply_middlewares(&mut record);
        assert_eq!(record.request.method, "");
    }
}
