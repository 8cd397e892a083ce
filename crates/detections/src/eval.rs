use dsl::Arg;
use models::{Record, Response};

/// Evaluate the record's ordered detection expressions. The combine policy
/// is AND: the first failing expression short-circuits. On success the
/// full matched conjunction is returned for the finding.
pub fn evaluate(record: &Record) -> Option<String> {
    let exprs = &record.request.detections;
    if exprs.is_empty() {
        return None;
    }
    for raw in exprs {
        let expr = match dsl::parse(raw) {
            Ok(expr) => expr,
            Err(err) => {
                tracing::warn!(expression = %raw, error = %err, "unparseable detection");
                return None;
            }
        };
        if !expr.eval(&mut |name, args| predicate(record, name, args)) {
            return None;
        }
    }
    Some(exprs.join(" && "))
}

/// Condition gates run before anything is sent; a failing or unparseable
/// condition drops the job quietly.
pub fn check_conditions(record: &Record) -> bool {
    record.request.conditions.iter().all(|raw| match dsl::parse(raw) {
        Ok(expr) => expr.eval(&mut |name, args| predicate(record, name, args)),
        Err(err) => {
            tracing::warn!(condition = %raw, error = %err, "unparseable condition");
            false
        }
    })
}

fn predicate(record: &Record, name: &str, args: &[Arg]) -> bool {
    let res = &record.response;
    match name {
        "StatusCode" => int_arg(args, 0).map_or(false, |n| res.status_code as i64 == n),
        "ContentContains" => res.body.contains(&str_arg(args, 0)),
        "ContentRegex" => regex_match(&str_arg(args, 0), &res.body),
        "HeaderContains" => header_contains(res, &str_arg(args, 0)),
        "ResponseContains" => res.beautify.contains(&str_arg(args, 0)),
        "ResponseRegex" => regex_match(&str_arg(args, 0), &res.beautify),
        "ResponseSize" => sized(args, res.length as f64),
        "ResponseTime" => sized(args, res.response_time),
        "OriginStatusCode" => {
            int_arg(args, 0).map_or(false, |n| record.origin_res.status_code as i64 == n)
        }
        "OriginContentContains" => record.origin_res.body.contains(&str_arg(args, 0)),
        other => {
            tracing::warn!(predicate = other, "unknown detection predicate");
            false
        }
    }
}

fn header_contains(res: &Response, needle: &str) -> bool {
    res.headers.iter().any(|header| {
        header
            .iter()
            .any(|(name, value)| format!("{name}: {value}").contains(needle))
    })
}

// One numeric argument means equality; `(op, n)` compares with one of
// `>`, `<`, `>=`, `<=`, `==`.
fn sized(args: &[Arg], actual: f64) -> bool {
    match args.len() {
        1 => float_arg(args, 0).map_or(false, |n| actual == n),
        2 => {
            let op = str_arg(args, 0);
            float_arg(args, 1).map_or(false, |n| compare(&op, actual, n))
        }
        _ => false,
    }
}

fn compare(op: &str, lhs: f64, rhs: f64) -> bool {
    match op {
        ">" => lhs > rhs,
        "<" => lhs < rhs,
        ">=" => lhs >= rhs,
        "<=" => lhs <= rhs,
        "==" => lhs == rhs,
        _ => {
            tracing::warn!(op, "unknown comparison operator");
            false
        }
    }
}

fn regex_match(pattern: &str, haystack: &str) -> bool {
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(haystack),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid detection regex");
            false
        }
    }
}

fn str_arg(args: &[Arg], at: usize) -> String {
    args.get(at).map(|a| a.as_str()).unwrap_or_default()
}

fn int_arg(args: &[Arg], at: usize) -> Option<i64> {
    args.get(at).and_then(|a| a.as_int())
}

fn float_arg(args: &[Arg], at: usize) -> Option<f64> {
    args.get(at).and_then(|a| a.as_float())
}
