use std::sync::Arc;
use std::time::Duration;

use models::{Finding, Options, Record};
use tokio::sync::{mpsc, Mutex};

/// One homogeneous worker: pulls records off the shared job channel until
/// it closes, processing each strictly in sequence.
pub(crate) async fn worker_loop(
    jobs: Arc<Mutex<mpsc::Receiver<Record>>>,
    findings: mpsc::Sender<Finding>,
    options: Options,
) {
    loop {
        let next = { jobs.lock().await.recv().await };
        let Some(mut record) = next else {
            break;
        };
        process_record(&mut record, &findings, &options).await;
        if options.delay > 0 {
            tokio::time::sleep(Duration::from_secs(options.delay)).await;
        }
    }
}

// conditions → middlewares → sender (unless a middleware pre-populated
// the response) → detections → conclusions. Errors drop this one job.
async fn process_record(record: &mut Record, findings: &mpsc::Sender<Finding>, options: &Options) {
    if !detections::check_conditions(record) {
        tracing::debug!(url = %record.request.url, "condition gate dropped job");
        return;
    }
    detections::apply_middlewares(record);

    if !record.response.is_populated() {
        match sender::send(options, &record.request).await {
            Ok(response) => record.response = response,
            Err(err) => {
                tracing::debug!(url = %record.request.url, error = %err, "dropping job");
                return;
            }
        }
    }

    if let Some(matched) = detections::evaluate(record) {
        let finding = Finding {
            scan_id: record.scan_id.clone(),
            signature_id: record.sign.id.clone(),
            category: record.sign.info.category.clone(),
            risk: record.sign.info.risk.clone(),
            request: record.request.clone(),
            response: record.response.clone(),
            matched_detection: matched,
            vuln_url: record.request.url.clone(),
        };
        if findings.send(finding).await.is_err() {
            tracing::warn!("finding sink closed early");
        }
    }

    detections::apply_conclusions(record, options);
}
