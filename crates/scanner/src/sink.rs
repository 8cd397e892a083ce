use std::fs;
use std::path::Path;
use std::sync::Arc;

use models::{Finding, Options};
use store::Store;
use tokio::sync::mpsc;

/// The single writer findings arrive at, in completion order. Owns stdout
/// reporting, store writes and artifact files; a failed write is logged
/// and never blocks workers.
pub(crate) async fn sink_loop(
    mut findings: mpsc::Receiver<Finding>,
    store: Arc<dyn Store>,
    options: Options,
) -> usize {
    let mut count = 0usize;
    while let Some(finding) = findings.recv().await {
        count += 1;
        if options.quiet {
            println!(
                "{}",
                resolver::resolve(&options.quiet_format, &finding.variables())
            );
        } else {
            println!(
                "[{}][{}] {}",
                finding.risk, finding.signature_id, finding.vuln_url
            );
        }

        if let Err(err) = store.record_finding(&finding) {
            tracing::warn!(error = %err, "failed to persist finding");
        }
        if !options.no_output {
            if let Err(err) = write_artifact(&options, &finding) {
                tracing::warn!(error = %err, "failed to write finding artifact");
            }
        }
    }
    count
}

// out/<category>/<signature-id>-<stamp>.txt with the beautified exchange.
fn write_artifact(options: &Options, finding: &Finding) -> std::io::Result<()> {
    let dir = Path::new(&options.output).join(sanitize(&finding.category));
    fs::create_dir_all(&dir)?;

    let stamp = uuid::Uuid::new_v4().simple().to_string();
    let name = format!("{}-{}.txt", sanitize(&finding.signature_id), &stamp[..8]);
    let content = format!(
        "{}\n{}",
        sender::beautify_request(&finding.request),
        finding.response.beautify
    );
    fs::write(dir.join(name), content)
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
