use indexmap::IndexMap;
use lazy_static::lazy_static;
use models::Header;
use regex::{Captures, Regex};

lazy_static! {
    static ref EARLY: Regex = Regex::new(r"\{\{\.([A-Za-z0-9_]+)\}\}").unwrap();
    static ref LATE: Regex = Regex::new(r"\[\[\.([A-Za-z0-9_]+)\]\]").unwrap();
}

/// Single-pass `{{.Name}}` substitution. Unknown names stay literal and
/// `[[.Name]]` placeholders pass through untouched.
pub fn resolve(text: &str, vars: &IndexMap<String, String>) -> String {
    EARLY
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Apply `resolve` to each key and each value across the ordered header
/// list, preserving duplicate-key order.
pub fn resolve_headers(headers: &[Header], vars: &IndexMap<String, String>) -> Vec<Header> {
    headers
        .iter()
        .map(|entry| {
            entry
                .iter()
                .map(|(k, v)| (resolve(k, vars), resolve(v, vars)))
                .collect()
        })
        .collect()
}

/// Resolve each expression string of a detection/middleware/conclusion
/// list. The expressions are parsed later, by their evaluator.
pub fn resolve_list(exprs: &[String], vars: &IndexMap<String, String>) -> Vec<String> {
    exprs.iter().map(|e| resolve(e, vars)).collect()
}

/// Names of `[[.Name]]` late placeholders in `text`, first-seen order,
/// deduplicated.
pub fn late_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in LATE.captures_iter(text) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Substitute one late placeholder. All occurrences of `[[.name]]` are
/// replaced.
pub fn resolve_late(text: &str, name: &str, value: &str) -> String {
    text.replace(&format!("[[.{name}]]"), value)
}

#[cfg(test)]
mod test {
    use super::{late_names, resolve, resolve_headers, resolve_late};
    use indexmap::IndexMap;

    fn vars() -> IndexMap<String, String> {
        IndexMap::from([
            ("URL".to_string(), "https://x/y".to_string()),
            ("oob".to_string(), "h.example".to_string()),
        ])
    }

    #[test]
    fn resolves_known_names() {
        assert_eq!(
            resolve("{{.URL}}?c={{.oob}}", &vars()),
            "https://x/y?c=h.example"
        );
    }

    #[test]
    fn unknown_names_stay_literal() {
        assert_eq!(resolve("{{.Nope}}/z", &vars()), "{{.Nope}}/z");
    }

    #[test]
    fn late_placeholders_pass_through_early_resolution() {
        assert_eq!(
            resolve("{{.URL}}?q=[[.payload]]", &vars()),
            "https://x/y?q=[[.payload]]"
        );
    }

    #[test]
    fn resolution_distributes_over_concatenation() {
        let (a, b) = ("{{.URL}}?c=", "{{.oob}}&d={{.URL}}");
        let joined = format!("{a}{b}");
        assert_eq!(
            resolve(&joined, &vars()),
            format!("{}{}", resolve(a, &vars()), resolve(b, &vars()))
        );
    }

    #[test]
    fn header_order_and_duplicates_survive() {
        let headers = vec![
            IndexMap::from([("X-First".to_string(), "{{.oob}}".to_string())]),
            IndexMap::from([("Cookie".to_string(), "a=1".to_string())]),
            IndexMap::from([("Cookie".to_string(), "b={{.URL}}".to_string())]),
        ];
        let resolved = resolve_headers(&headers, &vars());
        let flat: Vec<(String, String)> = resolved
            .iter()
            .flat_map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("X-First".to_string(), "h.example".to_string()),
                ("Cookie".to_string(), "a=1".to_string()),
                ("Cookie".to_string(), "b=https://x/y".to_string()),
            ]
        );
    }

    #[test]
    fn late_name_extraction_and_substitution() {
        let text = "/?q=[[.payload]]&r=[[.num]]&again=[[.payload]]";
        assert_eq!(late_names(text), vec!["payload", "num"]);
        assert_eq!(
            resolve_late(text, "payload", "a"),
            "/?q=a&r=[[.num]]&again=a"
        );
    }
}
