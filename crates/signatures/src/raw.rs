use indexmap::IndexMap;
use models::Request;

/// Parse a raw HTTP request blob (request-line, headers, blank line,
/// optional body) into a Request, preserving the raw text.
///
/// When the request-line target is not absolute, the host comes from the
/// `Host` header and the scheme from the `Referer` header's scheme, else
/// `https`. A blob without a parseable request line still comes back with
/// `raw` set; the empty method fails the sender's whitelist later, which
/// drops that one job.
pub fn parse_raw(raw: &str) -> Request {
    let mut req = Request {
        raw: raw.to_string(),
        ..Request::default()
    };

    let (head, body) = match raw.split_once("\r\n\r\n") {
        Some((head, body)) => (head, body),
        None => raw.split_once("\n\n").unwrap_or((raw, "")),
    };

    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(uri)) = (parts.next(), parts.next()) else {
        return req;
    };

    let mut headers: Vec<IndexMap<String, String>> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push(IndexMap::from([(
                name.trim().to_string(),
                value.trim_start().to_string(),
            )]));
        }
    }

    req.method = method.to_ascii_uppercase();
    req.path = uri.to_string();
    req.body = body.to_string();
    req.headers = headers;

    if uri.starts_with("http://") || uri.starts_with("https://") {
        req.url = uri.to_string();
        return req;
    }

    let host = req.header("Host").unwrap_or_default().to_string();
    if host.is_empty() {
        // Nothing to anchor the URL to; leave it empty so the request is
        // dropped as a construction error.
        return req;
    }
    let scheme = req
        .header("Referer")
        .and_then(|referer| url::Url::parse(referer).ok())
        .map(|u| u.scheme().to_string())
        .unwrap_or_else(|| "https".to_string());
    req.url = format!("{scheme}://{host}{uri}");
    req
}
