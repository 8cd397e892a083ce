//! The persistent-store interface the engine consumes: recorded scans,
//! findings, the default signature selector, and out-of-band hosts. The
//! core depends only on the `Store` trait; `MemoryStore` is the bundled
//! implementation. A failed store write is surfaced at the finding sink
//! and never blocks workers.

use std::sync::Mutex;

use models::Finding;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("store state is poisoned")]
    Poisoned,
}

/// One recorded engine invocation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanInfo {
    pub id: String,
    pub targets: usize,
    pub signatures: usize,
}

pub trait Store: Send + Sync {
    fn record_scan(&self, scan: &ScanInfo) -> Result<(), Error>;
    fn record_finding(&self, finding: &Finding) -> Result<(), Error>;
    fn findings(&self, scan_id: &str) -> Result<Vec<Finding>, Error>;

    /// Selector applied when the caller names none. Seeded as `*`.
    fn default_selector(&self) -> Result<String, Error>;
    fn set_default_selector(&self, selector: &str) -> Result<(), Error>;

    /// The preferred out-of-band host, if one was configured.
    fn default_oob(&self) -> Result<Option<String>, Error>;
    fn set_default_oob(&self, host: &str) -> Result<(), Error>;

    /// Fallback pool consulted when no default out-of-band host is set.
    fn oob_pool(&self) -> Result<Vec<String>, Error>;
    fn push_oob(&self, host: &str) -> Result<(), Error>;
}

#[derive(Debug, Default)]
struct Inner {
    scans: Vec<ScanInfo>,
    findings: Vec<Finding>,
    default_selector: String,
    default_oob: Option<String>,
    oob_pool: Vec<String>,
}

/// In-memory `Store`, also the test double for anything consuming the
/// trait.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            inner: Mutex::new(Inner {
                default_selector: "*".to_string(),
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, Error> {
        self.inner.lock().map_err(|_| Error::Poisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl Store for MemoryStore {
    fn record_scan(&self, scan: &ScanInfo) -> Result<(), Error> {
        self.lock()?.scans.push(scan.clone());
        Ok(())
    }

    fn record_finding(&self, finding: &Finding) -> Result<(), Error> {
        self.lock()?.findings.push(finding.clone());
        Ok(())
    }

    fn findings(&self, scan_id: &str) -> Result<Vec<Finding>, Error> {
        Ok(self
            .lock()?
            .findings
            .iter()
            .filter(|f| f.scan_id == scan_id)
            .cloned()
            .collect())
    }

    fn default_selector(&self) -> Result<String, Error> {
        Ok(self.lock()?.default_selector.clone())
    }

    fn set_default_selector(&self, selector: &str) -> Result<(), Error> {
        self.lock()?.default_selector = selector.to_string();
        Ok(())
    }

    fn default_oob(&self) -> Result<Option<String>, Error> {
        Ok(self.lock()?.default_oob.clone())
    }

    fn set_default_oob(&self, host: &str) -> Result<(), Error> {
        self.lock()?.default_oob = Some(host.to_string());
        Ok(())
    }

    fn oob_pool(&self) -> Result<Vec<String>, Error> {
        Ok(self.lock()?.oob_pool.clone())
    }

    fn push_oob(&self, host: &str) -> Result<(), Error> {
        self.lock()?.oob_pool.push(host.to_string());
        Ok(())
    }
}
