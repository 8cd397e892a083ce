use std::time::{Duration, Instant};

use exponential_backoff::Backoff;
use indexmap::IndexMap;
use models::{Header, Options, Request, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use crate::beautify::beautify_response;
use crate::headers::{parse_method, prepare_headers};
use crate::Error;

/// Perform one HTTP exchange for a concrete request.
///
/// Certificate verification is disabled: self-signed endpoints are part of
/// the job. With `redirect = false` (the default) a 3xx response is
/// captured verbatim and returned without following; with `redirect =
/// true` redirects are followed transparently. Transport failures are
/// retried `options.retry` times with exponential backoff bounded by
/// `[timeout/2, timeout]`; a captured redirect is a response, never a
/// retry.
pub async fn send(options: &Options, req: &Request) -> Result<Response, Error> {
    let method = parse_method(&req.method)?;
    let url = url::Url::parse(&req.url).map_err(|source| Error::InvalidUrl {
        url: req.url.clone(),
        source,
    })?;
    let header_map = to_header_map(&prepare_headers(req));

    let timeout = if req.timeout > 0 {
        req.timeout
    } else {
        options.timeout
    };
    let client = build_client(options, req, timeout)?;

    let ceiling = Duration::from_secs(timeout.max(1));
    let backoff = Backoff::new(
        options.retry.max(1),
        Duration::from_secs((timeout / 2).max(1)),
        Some(ceiling),
    );

    let mut attempt: u32 = 0;
    loop {
        let started = Instant::now();
        let result = client
            .request(method.clone(), url.clone())
            .headers(header_map.clone())
            .body(req.body.clone())
            .send()
            .await;

        match result {
            Ok(resp) => return Ok(read_response(resp, started).await),
            Err(err) => {
                attempt += 1;
                if attempt > options.retry {
                    tracing::error!(url = %req.url, error = %err, "request failed");
                    return Err(Error::Transport {
                        url: req.url.clone(),
                        source: err,
                    });
                }
                let wait = backoff.next(attempt).unwrap_or(ceiling);
                tracing::debug!(url = %req.url, attempt, ?wait, "retrying transport failure");
                tokio::time::sleep(wait).await;
            }
        }
    }
}

fn build_client(options: &Options, req: &Request, timeout: u64) -> Result<reqwest::Client, Error> {
    let policy = if req.redirect {
        Policy::limited(10)
    } else {
        Policy::none()
    };
    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(policy);
    if timeout > 0 {
        builder = builder.timeout(Duration::from_secs(timeout));
    }

    // Per-request proxy wins; "blank" explicitly disables any proxy.
    if req.proxy == "blank" {
        builder = builder.no_proxy();
    } else if !req.proxy.is_empty() {
        builder = builder.proxy(reqwest::Proxy::all(&req.proxy).map_err(Error::Client)?);
    } else if !options.proxy.is_empty() {
        builder = builder.proxy(reqwest::Proxy::all(&options.proxy).map_err(Error::Client)?);
    }

    builder.build().map_err(Error::Client)
}

fn to_header_map(headers: &[Header]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for header in headers {
        for (name, value) in header {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.append(name, value);
                }
                _ => tracing::warn!(header = name.as_str(), "skipping unencodable header"),
            }
        }
    }
    map
}

async fn read_response(resp: reqwest::Response, started: Instant) -> Response {
    let status_code = resp.status().as_u16();
    let status = format!(
        "{} {} {:?}",
        status_code,
        resp.status().canonical_reason().unwrap_or_default(),
        resp.version(),
    );
    let raw_headers: Vec<(String, String)> = resp
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = resp.text().await.unwrap_or_default();
    let response_time = started.elapsed().as_secs_f64();
    assemble_response(status, status_code, raw_headers, body, response_time)
}

/// Build the recorded Response from wire data. `length` is the byte count
/// of rendered header lines plus the body; the synthesised `Total Length`
/// and `Response Time` headers are appended after the count.
pub fn assemble_response(
    status: String,
    status_code: u16,
    raw_headers: Vec<(String, String)>,
    body: String,
    response_time: f64,
) -> Response {
    let mut length = body.len();
    let mut headers: Vec<Header> = Vec::with_capacity(raw_headers.len() + 2);
    for (name, value) in raw_headers {
        length += format!("{name}: {value}\n").len();
        headers.push(IndexMap::from([(name, value)]));
    }
    headers.push(IndexMap::from([(
        "Total Length".to_string(),
        length.to_string(),
    )]));
    headers.push(IndexMap::from([(
        "Response Time".to_string(),
        format!("{response_time:.6}"),
    )]));

    let mut res = Response {
        status,
        status_code,
        headers,
        body,
        response_time,
        length,
        beautify: String::new(),
    };
    res.beautify = beautify_response(&res);
    res
}
