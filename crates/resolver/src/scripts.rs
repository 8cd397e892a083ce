use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Evaluate one variable script such as `GenString(10)` or `Range(1, 5)`.
///
/// The script language is the same call syntax the detection DSL uses,
/// restricted to a single call over a fixed registry of functions. A
/// script yields zero or more values: params take the first, payload
/// sources take all of them. Unparseable or unknown scripts yield nothing
/// and are logged; they never abort a scan.
pub fn run_script(script: &str) -> Vec<String> {
    let expr = match dsl::parse(script) {
        Ok(expr) => expr,
        Err(err) => {
            tracing::warn!(script, error = %err, "unparseable variable script");
            return Vec::new();
        }
    };
    let Some((name, args)) = expr.as_call() else {
        tracing::warn!(script, "variable script must be a single call");
        return Vec::new();
    };

    match name {
        "GenString" => {
            let length = args.first().and_then(|a| a.as_int()).unwrap_or(8).max(1);
            vec![gen_string(length as usize)]
        }
        "RandInt" => {
            let min = args.first().and_then(|a| a.as_int()).unwrap_or(0);
            let max = args.get(1).and_then(|a| a.as_int()).unwrap_or(i32::MAX as i64);
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            vec![rand::thread_rng().gen_range(min..=max).to_string()]
        }
        "Range" => {
            let from = args.first().and_then(|a| a.as_int()).unwrap_or(0);
            let to = args.get(1).and_then(|a| a.as_int()).unwrap_or(from);
            if from <= to {
                (from..=to).map(|n| n.to_string()).collect()
            } else {
                Vec::new()
            }
        }
        "List" => args.iter().map(|a| a.as_str()).collect(),
        "Timestamp" => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            vec![now.as_secs().to_string()]
        }
        other => {
            tracing::warn!(function = other, "unknown variable script function");
            Vec::new()
        }
    }
}

fn gen_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// A value is treated as a script when it carries a parenthesised call.
pub fn looks_like_script(value: &str) -> bool {
    value.contains('(') && value.contains(')')
}
