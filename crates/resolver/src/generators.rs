use models::{Request, Signature};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::scripts::{looks_like_script, run_script};
use crate::template::{late_names, resolve_late};

/// Expand one early-resolved request over its `[[.Name]]` late
/// placeholders, producing the cartesian set of substituted requests.
///
/// The `payload` source is the signature's payload list; any other name
/// draws from the signature `variables` entry of that name, with script
/// values expanded. Generator directives transform the values of the
/// source they name before substitution; an empty directive list means
/// `Identity(payload)`. An empty payload source yields an empty fan-out,
/// not an error.
pub fn generate(req: &Request, sign: &Signature) -> Vec<Request> {
    let names = collect_names(req);
    if names.is_empty() {
        return vec![req.clone()];
    }

    let directives: Vec<Directive> = if req.generators.is_empty() {
        vec![Directive::identity()]
    } else {
        req.generators
            .iter()
            .filter_map(|g| Directive::parse(g))
            .collect()
    };

    let mut out = Vec::new();
    for directive in &directives {
        let mut axes: Vec<(String, Vec<String>)> = Vec::new();
        for name in &names {
            let mut values = source_values(name, sign);
            if *name == directive.source {
                values = values.iter().map(|v| directive.transform(v)).collect();
            }
            if !req.encoding.is_empty() {
                values = values.iter().map(|v| encode(&req.encoding, v)).collect();
            }
            axes.push((name.clone(), values));
        }
        if axes.iter().any(|(_, values)| values.is_empty()) {
            continue;
        }

        let mut cursor = vec![0usize; axes.len()];
        'product: loop {
            let mut concrete = req.clone();
            for (at, (name, values)) in cursor.iter().zip(&axes) {
                substitute(&mut concrete, name, &values[*at]);
            }
            out.push(concrete);

            // Odometer increment, rightmost axis fastest.
            let mut axis = axes.len();
            loop {
                if axis == 0 {
                    break 'product;
                }
                axis -= 1;
                cursor[axis] += 1;
                if cursor[axis] < axes[axis].1.len() {
                    break;
                }
                cursor[axis] = 0;
                if axis == 0 {
                    break 'product;
                }
            }
        }
    }
    out
}

fn collect_names(req: &Request) -> Vec<String> {
    let mut names = late_names(&req.url);
    let mut push_from = |text: &str| {
        for name in late_names(text) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    };
    push_from(&req.body);
    for header in &req.headers {
        for (k, v) in header {
            push_from(k);
            push_from(v);
        }
    }
    names
}

fn source_values(name: &str, sign: &Signature) -> Vec<String> {
    if name == "payload" {
        return sign.clean_payloads();
    }
    match sign.variable(name) {
        Some(value) if looks_like_script(value) => run_script(value),
        Some(value) => vec![value.to_string()],
        None => {
            tracing::debug!(source = name, "no payload source for placeholder");
            Vec::new()
        }
    }
}

fn substitute(req: &mut Request, name: &str, value: &str) {
    req.url = resolve_late(&req.url, name, value);
    req.body = resolve_late(&req.body, name, value);
    req.headers = req
        .headers
        .iter()
        .map(|entry| {
            entry
                .iter()
                .map(|(k, v)| (resolve_late(k, name, value), resolve_late(v, name, value)))
                .collect()
        })
        .collect();
}

fn encode(encoding: &str, value: &str) -> String {
    match encoding {
        "url" => utf8_percent_encode(value, NON_ALPHANUMERIC).to_string(),
        "base64" => base64::encode(value),
        other => {
            tracing::warn!(encoding = other, "unknown payload encoding");
            value.to_string()
        }
    }
}

struct Directive {
    func: String,
    source: String,
    extras: Vec<String>,
}

impl Directive {
    fn identity() -> Directive {
        Directive {
            func: "Identity".to_string(),
            source: "payload".to_string(),
            extras: Vec::new(),
        }
    }

    fn parse(text: &str) -> Option<Directive> {
        let expr = match dsl::parse(text) {
            Ok(expr) => expr,
            Err(err) => {
                tracing::warn!(directive = text, error = %err, "unparseable generator");
                return None;
            }
        };
        let Some((name, args)) = expr.as_call() else {
            tracing::warn!(directive = text, "generator must be a single call");
            return None;
        };
        match name {
            "Identity" | "Prefix" | "Append" | "Replace" | "UrlEncode" | "Base64" => {
                Some(Directive {
                    func: name.to_string(),
                    source: args
                        .first()
                        .map(|a| a.as_str())
                        .unwrap_or_else(|| "payload".to_string()),
                    extras: args.iter().skip(1).map(|a| a.as_str()).collect(),
                })
            }
            other => {
                tracing::warn!(generator = other, "unknown generator");
                None
            }
        }
    }

    fn transform(&self, value: &str) -> String {
        match self.func.as_str() {
            "Prefix" => format!(
                "{}{}",
                self.extras.first().map(String::as_str).unwrap_or_default(),
                value
            ),
            "Append" => format!(
                "{}{}",
                value,
                self.extras.first().map(String::as_str).unwrap_or_default()
            ),
            "Replace" => {
                let from = self.extras.first().map(String::as_str).unwrap_or_default();
                let to = self.extras.get(1).map(String::as_str).unwrap_or_default();
                if from.is_empty() {
                    value.to_string()
                } else {
                    value.replace(from, to)
                }
            }
            "UrlEncode" => utf8_percent_encode(value, NON_ALPHANUMERIC).to_string(),
            "Base64" => base64::encode(value),
            _ => value.to_string(),
        }
    }
}
