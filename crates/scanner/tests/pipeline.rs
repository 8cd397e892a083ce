use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use models::Options;
use scanner::Runner;
use store::{MemoryStore, Store};

fn write_sign(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn quiet_options() -> Options {
    Options {
        concurrency: 4,
        quiet: true,
        no_output: true,
        ..Options::default()
    }
}

#[tokio::test]
async fn static_response_signature_matches_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let sign = write_sign(
        &dir,
        "t-basic.yaml",
        r#"
id: t-basic
requests:
  - url: "{{.BaseURL}}/admin"
    middlewares:
      - 'StaticResponse(200, "root:x:0:0")'
    detections:
      - 'StatusCode(200)'
      - 'ContentContains("root:")'
"#,
    );

    let store = Arc::new(MemoryStore::new());
    let runner = Runner::new(quiet_options(), store.clone());
    let summary = runner
        .run(&["https://example.com".to_string()], &[sign])
        .await
        .unwrap();

    assert_eq!(summary.jobs, 1);
    assert_eq!(summary.findings, 1);

    let findings = store.findings(&summary.scan_id).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].signature_id, "t-basic");
    assert_eq!(findings[0].category, "t");
    assert_eq!(findings[0].risk, "Potential");
    assert_eq!(findings[0].vuln_url, "https://example.com/admin");
    assert!(findings[0].matched_detection.contains("StatusCode(200)"));
}

#[tokio::test]
async fn fuzz_signature_expands_one_job_per_payload() {
    let dir = tempfile::tempdir().unwrap();
    let sign = write_sign(
        &dir,
        "fuzz-query.yaml",
        r#"
id: fuzz-query
type: fuzz
payloads:
  - a
  - b
  - c
requests:
  - url: "{{.BaseURL}}/?q=[[.payload]]"
    middlewares:
      - 'StaticResponse(404, "not here")'
    detections:
      - 'StatusCode(200)'
"#,
    );

    let store = Arc::new(MemoryStore::new());
    let runner = Runner::new(quiet_options(), store);
    let summary = runner
        .run(&["https://example.com".to_string()], &[sign])
        .await
        .unwrap();

    assert_eq!(summary.jobs, 3);
    assert_eq!(summary.findings, 0);
}

#[tokio::test]
async fn failing_condition_drops_the_job_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let sign = write_sign(
        &dir,
        "gated.yaml",
        r#"
id: gated
requests:
  - url: "{{.BaseURL}}/x"
    conditions:
      - 'OriginStatusCode(200)'
    middlewares:
      - 'StaticResponse(200, "would match")'
    detections:
      - 'StatusCode(200)'
"#,
    );

    let store = Arc::new(MemoryStore::new());
    let runner = Runner::new(quiet_options(), store);
    let summary = runner
        .run(&["https://example.com".to_string()], &[sign])
        .await
        .unwrap();

    assert_eq!(summary.jobs, 1);
    assert_eq!(summary.findings, 0);
}

#[tokio::test]
async fn findings_sort_deterministically_across_signatures() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"
requests:
  - url: "{{.BaseURL}}/probe"
    middlewares:
      - 'StaticResponse(200, "hit")'
    detections:
      - 'StatusCode(200)'
"#;
    let b = write_sign(&dir, "b-two.yaml", &format!("id: b-two{body}"));
    let a = write_sign(&dir, "a-one.yaml", &format!("id: a-one{body}"));

    let store = Arc::new(MemoryStore::new());
    let runner = Runner::new(quiet_options(), store.clone());
    let summary = runner
        .run(&["https://example.com".to_string()], &[b, a])
        .await
        .unwrap();
    assert_eq!(summary.findings, 2);

    let mut findings = store.findings(&summary.scan_id).unwrap();
    findings.sort_by(|x, y| {
        (x.signature_id.as_str(), x.vuln_url.as_str())
            .cmp(&(y.signature_id.as_str(), y.vuln_url.as_str()))
    });
    let ids: Vec<&str> = findings.iter().map(|f| f.signature_id.as_str()).collect();
    assert_eq!(ids, vec!["a-one", "b-two"]);
}

#[tokio::test]
async fn scan_id_is_reused_when_supplied() {
    let dir = tempfile::tempdir().unwrap();
    let sign = write_sign(
        &dir,
        "t-reuse.yaml",
        r#"
id: t-reuse
requests:
  - url: "{{.BaseURL}}/x"
    middlewares:
      - 'StaticResponse(200, "hit")'
    detections:
      - 'StatusCode(200)'
"#,
    );

    let options = Options {
        scan_id: "scan-fixed".to_string(),
        ..quiet_options()
    };
    let store = Arc::new(MemoryStore::new());
    let runner = Runner::new(options, store.clone());
    let summary = runner
        .run(&["https://example.com".to_string()], &[sign])
        .await
        .unwrap();

    assert_eq!(summary.scan_id, "scan-fixed");
    assert_eq!(store.findings("scan-fixed").unwrap().len(), 1);
}
