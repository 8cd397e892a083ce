use std::path::PathBuf;

use crate::logging::{init_logging, LogArgs};

#[derive(Debug, clap::Args)]
#[clap(rename_all = "kebab-case")]
pub struct ListArgs {
    #[clap(flatten)]
    log_args: LogArgs,

    /// Signature selector (repeatable)
    #[clap(short = 's', long = "signs", default_value = "*")]
    signs: Vec<String>,
    /// Exclude selected signatures by substring or regex (repeatable)
    #[clap(short = 'x', long = "exclude")]
    excludes: Vec<String>,
    /// Folder holding the signature library
    #[clap(short = 'B', long = "sign-dir", env = "SIGSCAN_SIGNS", default_value = "signatures")]
    sign_dir: PathBuf,
}

/// Print the files the selectors resolve to, one per line, after
/// exclusions. Useful when authoring selectors.
pub fn run(args: ListArgs) -> anyhow::Result<()> {
    init_logging(&args.log_args, false, false);

    let mut files = Vec::new();
    for selector in &args.signs {
        for path in signatures::select_signs(selector, &args.sign_dir) {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    let files = signatures::apply_excludes(files, &args.excludes);
    if files.is_empty() {
        tracing::warn!(selectors = ?args.signs, "no signatures matched");
    }
    for path in files {
        println!("{}", path.display());
    }
    Ok(())
}
