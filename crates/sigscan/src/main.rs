mod list;
mod logging;
mod scan;

use clap::Parser;

/// sigscan is a signature-driven web vulnerability scanner: it runs
/// declarative YAML signatures against target URLs and reports matches as
/// findings.
#[derive(Debug, Parser)]
#[clap(author, name = "sigscan", version)]
struct Sigscan {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
enum Subcommand {
    /// Run selected signatures against the given targets
    Scan(scan::ScanArgs),
    /// List the signature files a selector resolves to
    Signatures(list::ListArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Sigscan::parse();
    match cli.subcommand {
        Subcommand::Scan(args) => scan::run(args).await,
        Subcommand::Signatures(args) => list::run(args),
    }
}
