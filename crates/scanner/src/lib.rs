//! The scan driver: expands `(target, signature)` pairs into jobs, feeds
//! them through a bounded worker pool, and forwards findings to the
//! single-writer sink.
//!
//! One producer loop fills a job channel whose capacity equals the
//! concurrency setting, so it blocks when workers fall behind; workers
//! pull until the channel closes. Within one record the order is strictly
//! conditions → middlewares → sender → detections → conclusions; across
//! workers there is none.

mod sink;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use indexmap::IndexMap;
use models::{Options, Record, Request, Response, SignType, Signature, Target};
use store::{ScanInfo, Store};
use tokio::sync::{mpsc, Mutex};

/// Outcome of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub scan_id: String,
    pub jobs: usize,
    pub findings: usize,
}

pub struct Runner {
    options: Options,
    store: Arc<dyn Store>,
}

impl Runner {
    pub fn new(options: Options, store: Arc<dyn Store>) -> Runner {
        Runner { options, store }
    }

    /// Run every signature against every target. Signatures that fail to
    /// load are skipped with a warning; an empty usable set is an error.
    pub async fn run(
        &self,
        targets: &[String],
        sign_files: &[PathBuf],
    ) -> anyhow::Result<ScanSummary> {
        let mut signs = Vec::new();
        for path in sign_files {
            match signatures::load(path) {
                Ok(sign) => signs.push(sign),
                Err(err) => tracing::warn!(error = %err, "skipping signature"),
            }
        }
        anyhow::ensure!(!signs.is_empty(), "no usable signatures loaded");

        let scan_id = if self.options.scan_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.options.scan_id.clone()
        };
        if let Err(err) = self.store.record_scan(&ScanInfo {
            id: scan_id.clone(),
            targets: targets.len(),
            signatures: signs.len(),
        }) {
            tracing::warn!(error = %err, "failed to record scan");
        }
        let oob = self.oob_host();

        let concurrency = self.options.concurrency.max(1);
        let (job_tx, job_rx) = mpsc::channel::<Record>(concurrency);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (finding_tx, finding_rx) = mpsc::channel(concurrency);

        let sink = tokio::spawn(sink::sink_loop(
            finding_rx,
            self.store.clone(),
            self.options.clone(),
        ));
        let workers: Vec<_> = (0..concurrency)
            .map(|_| {
                tokio::spawn(worker::worker_loop(
                    job_rx.clone(),
                    finding_tx.clone(),
                    self.options.clone(),
                ))
            })
            .collect();
        drop(finding_tx);

        let mut jobs = 0usize;
        'produce: for raw in targets {
            let target = Target::parse(raw);
            for sign in &signs {
                let mut bound = sign.clone();
                let vars = resolver::assemble(&target, &bound, &self.options, oob.as_deref());
                bound.target = vars.clone();

                let (origin_req, origin_res) = self.run_origin(&bound, &vars).await;
                let bound = Arc::new(bound);

                for tmpl in &bound.requests {
                    for mut request in signatures::instantiate(&bound, tmpl, &vars) {
                        merge_extra_headers(&mut request, &self.options.headers, &vars);
                        let record = Record {
                            origin_req: origin_req.clone(),
                            origin_res: origin_res.clone(),
                            request,
                            response: Response::default(),
                            extracted: IndexMap::new(),
                            scan_id: scan_id.clone(),
                            sign_id: bound.id.clone(),
                            sign: bound.clone(),
                        };
                        jobs += 1;
                        if job_tx.send(record).await.is_err() {
                            tracing::warn!("job channel closed; stopping producer");
                            break 'produce;
                        }
                    }
                }
            }
        }
        drop(job_tx);

        for handle in workers {
            handle.await.context("worker task failed")?;
        }
        let findings = sink.await.context("finding sink failed")?;

        Ok(ScanSummary {
            scan_id,
            jobs,
            findings,
        })
    }

    // The out-of-band host signatures see as `{{.oob}}`: explicit option,
    // else the store's configured default, else the pool.
    fn oob_host(&self) -> Option<String> {
        if !self.options.oob.is_empty() {
            return Some(self.options.oob.clone());
        }
        if let Ok(Some(host)) = self.store.default_oob() {
            return Some(host);
        }
        self.store
            .oob_pool()
            .ok()
            .and_then(|pool| pool.into_iter().next())
    }

    // The origin exchange runs once per (target, signature) pair; its
    // record is shared by every job of the pair.
    async fn run_origin(
        &self,
        sign: &Signature,
        vars: &IndexMap<String, String>,
    ) -> (Request, Response) {
        let Some(tmpl) = &sign.origin else {
            return (Request::default(), Response::default());
        };
        let mut as_single = sign.clone();
        as_single.sign_type = SignType::Single;

        let Some(request) = signatures::instantiate(&as_single, tmpl, vars)
            .into_iter()
            .next()
        else {
            return (Request::default(), Response::default());
        };
        match sender::send(&self.options, &request).await {
            Ok(response) => (request, response),
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "origin request failed");
                (request, Response::default())
            }
        }
    }
}

// Caller-supplied `Name: value` headers join every request that does not
// already carry the name.
fn merge_extra_headers(
    request: &mut Request,
    extra: &[String],
    vars: &IndexMap<String, String>,
) {
    for item in extra {
        let Some((name, value)) = item.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || request.header(name).is_some() {
            continue;
        }
        let value = resolver::resolve(value.trim_start(), vars);
        request
            .headers
            .push(IndexMap::from([(name.to_string(), value)]));
    }
}
