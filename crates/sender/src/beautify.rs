use models::{Request, Response};

/// Canonical text rendering of a concrete request: request line, headers
/// in stored order, blank line, body.
pub fn beautify_request(req: &Request) -> String {
    let mut out = format!("{} {} HTTP/1.1\n", req.method, req.url);
    for header in &req.headers {
        for (name, value) in header {
            if !name.is_empty() && !value.is_empty() {
                out.push_str(&format!("{name}: {value}\n"));
            }
        }
    }
    if !req.body.is_empty() {
        out.push_str(&format!("\n{}\n", req.body));
    }
    out
}

/// Canonical text rendering of a recorded response: status line, headers
/// in stored order, blank line, body. Deterministic given the response
/// fields.
pub fn beautify_response(res: &Response) -> String {
    let mut out = format!("{} \n", res.status);
    for header in &res.headers {
        for (name, value) in header {
            out.push_str(&format!("{name}: {value}\n"));
        }
    }
    out.push_str(&format!("\n{}\n", res.body));
    out
}
