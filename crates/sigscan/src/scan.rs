use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use models::Options;
use scanner::Runner;
use serde::Deserialize;
use store::{MemoryStore, Store};

use crate::logging::{init_logging, LogArgs};

#[derive(Debug, clap::Args)]
#[clap(rename_all = "kebab-case")]
pub struct ScanArgs {
    #[clap(flatten)]
    log_args: LogArgs,

    /// Target URL (repeatable)
    #[clap(short = 'u', long = "url")]
    urls: Vec<String>,
    /// Newline-delimited file of targets. When neither --url nor --urls is
    /// given, targets are read from stdin.
    #[clap(short = 'U', long = "urls")]
    url_file: Option<PathBuf>,
    /// Treat each target line as a JSON object carrying at least BaseURL
    #[clap(short = 'J', long = "format-input")]
    format_input: bool,

    /// Signature selector: a .yaml path, a glob, or a comma list (repeatable)
    #[clap(short = 's', long = "signs")]
    signs: Vec<String>,
    /// Exclude selected signatures by substring or regex (repeatable)
    #[clap(short = 'x', long = "exclude")]
    excludes: Vec<String>,
    /// Folder holding the signature library
    #[clap(short = 'B', long = "sign-dir", env = "SIGSCAN_SIGNS", default_value = "signatures")]
    sign_dir: PathBuf,
    /// Root project folder, exposed to templates as {{.rootPath}}
    #[clap(long = "root-dir", env = "SIGSCAN_ROOT", default_value = "")]
    root_dir: String,

    /// Custom template params, e.g. -p 'root=https://x' (repeatable)
    #[clap(short = 'p', long = "params")]
    params: Vec<String>,
    /// Extra header merged into every request, e.g. -H 'Referer: {{.BaseURL}}' (repeatable)
    #[clap(short = 'H', long = "headers")]
    headers: Vec<String>,

    /// Worker count; also bounds in-flight requests
    #[clap(short = 'c', long, default_value_t = 20)]
    concurrency: usize,
    /// HTTP timeout in seconds
    #[clap(long, default_value_t = 20)]
    timeout: u64,
    /// Retries on transport failure
    #[clap(long, default_value_t = 0)]
    retry: u32,
    /// Seconds to sleep between requests on each worker
    #[clap(long, default_value_t = 0)]
    delay: u64,
    /// Proxy for all requests, e.g. http://127.0.0.1:8080
    #[clap(long, default_value = "")]
    proxy: String,

    /// Group findings under an existing scan id instead of minting one
    #[clap(long = "scan-id", default_value = "")]
    scan_id: String,
    /// Folder findings artifacts are written under
    #[clap(short = 'o', long, default_value = "out")]
    output: String,
    /// Do not write finding artifacts to disk
    #[clap(long = "no-output")]
    no_output: bool,
    /// Out-of-band interaction host, referenced as {{.oob}}
    #[clap(long, default_value = "")]
    oob: String,

    /// Print one line per finding, rendered through --quiet-format
    #[clap(short = 'q', long)]
    quiet: bool,
    #[clap(long = "quiet-format", default_value = "{{.VulnURL}}")]
    quiet_format: String,
    #[clap(short = 'v', long)]
    verbose: bool,
    #[clap(long)]
    debug: bool,
}

impl ScanArgs {
    fn to_options(&self) -> Options {
        Options {
            concurrency: self.concurrency,
            timeout: self.timeout,
            retry: self.retry,
            delay: self.delay,
            proxy: self.proxy.clone(),
            root_folder: self.root_dir.clone(),
            sign_folder: self.sign_dir.display().to_string(),
            output: self.output.clone(),
            scan_id: self.scan_id.clone(),
            selectors: self.signs.clone(),
            excludes: self.excludes.clone(),
            params: self.params.clone(),
            headers: self.headers.clone(),
            oob: self.oob.clone(),
            quiet: self.quiet,
            quiet_format: self.quiet_format.clone(),
            verbose: self.verbose,
            debug: self.debug,
            format_input: self.format_input,
            no_output: self.no_output,
            ..Options::default()
        }
    }
}

pub async fn run(args: ScanArgs) -> anyhow::Result<()> {
    init_logging(&args.log_args, args.verbose, args.debug);

    let options = args.to_options();
    let store = Arc::new(MemoryStore::new());
    if !options.oob.is_empty() {
        store.set_default_oob(&options.oob)?;
    }

    let targets = gather_targets(&args)?;
    anyhow::ensure!(!targets.is_empty(), "no targets provided");

    let selectors = if options.selectors.is_empty() {
        vec![store.default_selector()?]
    } else {
        options.selectors.clone()
    };
    let mut files = Vec::new();
    for selector in &selectors {
        for path in signatures::select_signs(selector, &args.sign_dir) {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    let files = signatures::apply_excludes(files, &options.excludes);
    anyhow::ensure!(
        !files.is_empty(),
        "no signatures matched selector(s) {selectors:?} under {}",
        args.sign_dir.display()
    );

    tracing::info!(
        targets = targets.len(),
        signatures = files.len(),
        "starting scan"
    );
    let runner = Runner::new(options, store);
    let summary = runner.run(&targets, &files).await?;
    tracing::info!(
        scan_id = %summary.scan_id,
        jobs = summary.jobs,
        findings = summary.findings,
        "scan complete"
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
struct StructuredTarget {
    #[serde(rename = "BaseURL")]
    base_url: String,
}

fn gather_targets(args: &ScanArgs) -> anyhow::Result<Vec<String>> {
    let mut lines: Vec<String> = args.urls.clone();

    if let Some(path) = &args.url_file {
        let content = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("failed to read target file {}: {err}", path.display()))?;
        lines.extend(content.lines().map(str::to_string));
    }

    if lines.is_empty() && !atty::is(atty::Stream::Stdin) {
        for line in std::io::stdin().lock().lines() {
            lines.push(line?);
        }
    }

    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    if !args.format_input {
        return Ok(lines);
    }
    Ok(lines
        .iter()
        .filter_map(|line| match serde_json::from_str::<StructuredTarget>(line) {
            Ok(target) => Some(target.base_url),
            Err(err) => {
                tracing::warn!(line = %line, error = %err, "skipping unparseable structured target");
                None
            }
        })
        .collect())
}
