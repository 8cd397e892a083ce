use serde::{Deserialize, Serialize};

/// The full option set for one engine invocation. Threaded explicitly
/// through constructors; there is no ambient global configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Options {
    /// Bounded worker count; also the job-channel capacity.
    pub concurrency: usize,
    /// Global HTTP timeout in seconds.
    pub timeout: u64,
    /// Transport-failure retries per request.
    pub retry: u32,
    /// Seconds a worker sleeps between jobs.
    pub delay: u64,
    pub proxy: String,
    pub root_folder: String,
    pub sign_folder: String,
    pub resources_folder: String,
    /// Folder findings artifacts are written under.
    pub output: String,
    /// Reuse an earlier scan id instead of minting one.
    pub scan_id: String,
    pub selectors: Vec<String>,
    pub excludes: Vec<String>,
    /// Caller-supplied `name=value` params, split on the first `=`.
    pub params: Vec<String>,
    /// Extra `Name: value` headers merged into every request.
    pub headers: Vec<String>,
    /// Out-of-band interaction host signatures reference as `{{.oob}}`.
    pub oob: String,
    pub quiet: bool,
    pub quiet_format: String,
    pub verbose: bool,
    pub debug: bool,
    /// Targets arrive as one JSON object per line with at least `BaseURL`.
    pub format_input: bool,
    /// Skip writing finding artifacts to disk.
    pub no_output: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            concurrency: 20,
            timeout: 20,
            retry: 0,
            delay: 0,
            proxy: String::new(),
            root_folder: String::new(),
            sign_folder: String::new(),
            resources_folder: String::new(),
            output: "out".to_string(),
            scan_id: String::new(),
            selectors: Vec::new(),
            excludes: Vec::new(),
            params: Vec::new(),
            headers: Vec::new(),
            oob: String::new(),
            quiet: false,
            quiet_format: "{{.VulnURL}}".to_string(),
            verbose: false,
            debug: false,
            format_input: false,
            no_output: false,
        }
    }
}
