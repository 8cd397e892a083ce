use std::fs;
use std::path::PathBuf;

use models::{Options, Record};
use sender::{beautify_request, beautify_response};

/// Run the request's conclusion hooks. Conclusions execute after the match
/// decision regardless of its outcome and exist for side-effects:
/// `ExtractRegex("name", "re")` stores the first capture group of the
/// response body into the record's extracted values, `WriteOutput("name")`
/// writes the beautified exchange under the output folder. Failures are
/// logged and never abort the scan.
pub fn apply_conclusions(record: &mut Record, options: &Options) {
    let conclusions = record.request.conclusions.clone();
    for raw in &conclusions {
        let expr = match dsl::parse(raw) {
            Ok(expr) => expr,
            Err(err) => {
                tracing::warn!(conclusion = %raw, error = %err, "unparseable conclusion");
                continue;
            }
        };
        let Some((name, args)) = expr.as_call() else {
            tracing::warn!(conclusion = %raw, "conclusion must be a single call");
            continue;
        };

        match name {
            "ExtractRegex" => {
                let var = args.first().map(|a| a.as_str()).unwrap_or_default();
                let pattern = args.get(1).map(|a| a.as_str()).unwrap_or_default();
                extract_regex(record, &var, &pattern);
            }
            "WriteOutput" => {
                let artifact = args.first().map(|a| a.as_str()).unwrap_or_default();
                if let Err(err) = write_output(record, options, &artifact) {
                    tracing::warn!(artifact = %artifact, error = %err, "failed to write output artifact");
                }
            }
            other => tracing::warn!(conclusion = other, "unknown conclusion"),
        }
    }
}

fn extract_regex(record: &mut Record, var: &str, pattern: &str) {
    let re = match regex::Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid extraction regex");
            return;
        }
    };
    if let Some(value) = re
        .captures(&record.response.body)
        .and_then(|caps| caps.get(1))
    {
        record
            .extracted
            .insert(var.to_string(), value.as_str().to_string());
    }
}

fn write_output(record: &Record, options: &Options, artifact: &str) -> std::io::Result<()> {
    let name: String = artifact
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let dir = PathBuf::from(&options.output);
    fs::create_dir_all(&dir)?;
    let content = format!(
        "{}\n{}",
        beautify_request(&record.request),
        beautify_response(&record.response)
    );
    fs::write(dir.join(format!("{name}.txt")), content)
}

#[cfg(test)]
mod test {
    use super::apply_conclusions;
    use models::{Options, Record, Request, Response};

    fn record(conclusions: &[&str], body: &str) -> Record {
        Record {
            request: Request {
                url: "https://x/y".to_string(),
                conclusions: conclusions.iter().map(|c| c.to_string()).collect(),
                ..Request::default()
            },
            response: Response {
                status_code: 200,
                body: body.to_string(),
                ..Response::default()
            },
            ..Record::default()
        }
    }

    #[test]
    fn extract_regex_captures_into_the_record() {
        let mut record = record(
            &[r#"ExtractRegex("csrf", "name=\"csrf\" value=\"([a-f0-9]+)\"")"#],
            r#"<input name="csrf" value="deadbeef">"#,
        );
        apply_conclusions(&mut record, &Options::default());
        assert_eq!(record.extracted.get("csrf").unwrap(), "deadbeef");
    }

    #[test]
    fn no_capture_leaves_extracted_empty() {
        let mut record = record(&[r#"ExtractRegex("x", "nope-(\\d+)")"#], "nothing");
        apply_conclusions(&mut record, &Options::default());
        assert!(record.extracted.is_empty());
    }

    #[test]
    fn write_output_places_the_exchange_under_the_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            output: dir.path().display().to_string(),
            ..Options::default()
        };
        let mut record = record(&[r#"WriteOutput("probe one")"#], "body");
        apply_conclusions(&mut record, &options);

        let content = std::fs::read_to_string(dir.path().join("probe-one.txt")).unwrap();
        assert!(content.contains("https://x/y"));
        assert!(content.contains("body"));
    }

    #[test]
    fn broken_conclusions_are_skipped() {
        let mut record = record(&["ExtractRegex(", "Unknown(1)"], "body");
        apply_conclusions(&mut record, &Options::default());
        assert!(record.extracted.is_empty());
    }
}
