use indexmap::IndexMap;
use models::{Header, Request};
use reqwest::Method;

use crate::agents::random_agent;
use crate::Error;

/// Headers to put on the wire: a request with none gets a random
/// User-Agent; a request missing only `User-Agent` gets one appended.
/// Author-supplied headers are never dropped or reordered.
pub fn prepare_headers(req: &Request) -> Vec<Header> {
    let agent = || {
        IndexMap::from([(
            "User-Agent".to_string(),
            random_agent().to_string(),
        )])
    };

    if req.headers.is_empty() {
        return vec![agent()];
    }
    let mut headers = req.headers.clone();
    if req.header("User-Agent").map(str::is_empty).unwrap_or(true) {
        headers.push(agent());
    }
    headers
}

/// Map the request method onto the sender's whitelist. An empty method
/// reads as GET; anything outside the list is a request-construction
/// error and the job carrying it is dropped.
pub fn parse_method(method: &str) -> Result<Method, Error> {
    match method.to_ascii_uppercase().as_str() {
        "" | "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "HEAD" => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        "PATCH" => Ok(Method::PATCH),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        other => Err(Error::InvalidMethod(other.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::{parse_method, prepare_headers};
    use crate::agents::USER_AGENTS;
    use indexmap::IndexMap;
    use models::Request;

    #[test]
    fn bare_request_gets_a_pool_user_agent() {
        let headers = prepare_headers(&Request::default());
        assert_eq!(headers.len(), 1);
        let ua = headers[0].get("User-Agent").unwrap();
        assert!(USER_AGENTS.contains(&ua.as_str()));
    }

    #[test]
    fn author_headers_survive_and_user_agent_is_appended() {
        let req = Request {
            headers: vec![
                IndexMap::from([("Cookie".to_string(), "a=1".to_string())]),
                IndexMap::from([("Cookie".to_string(), "b=2".to_string())]),
            ],
            ..Request::default()
        };
        let headers = prepare_headers(&req);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].get("Cookie").unwrap(), "a=1");
        assert_eq!(headers[1].get("Cookie").unwrap(), "b=2");
        assert!(headers[2].contains_key("User-Agent"));
    }

    #[test]
    fn author_user_agent_is_left_alone() {
        let req = Request {
            headers: vec![IndexMap::from([(
                "user-agent".to_string(),
                "custom/1.0".to_string(),
            )])],
            ..Request::default()
        };
        let headers = prepare_headers(&req);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].get("user-agent").unwrap(), "custom/1.0");
    }

    #[test]
    fn method_whitelist() {
        assert_eq!(parse_method("get").unwrap(), reqwest::Method::GET);
        assert_eq!(parse_method("").unwrap(), reqwest::Method::GET);
        assert_eq!(parse_method("DELETE").unwrap(), reqwest::Method::DELETE);
        assert!(parse_method("TRACE").is_err());
        assert!(parse_method("BREW").is_err());
    }
}
