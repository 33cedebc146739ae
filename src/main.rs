//! Load harness binary.
//!
//! Usage:
//!   docload --users 10 --documents 2 --server ws://127.0.0.1:8001
//!   docload --base-url http://files.local/samples --changes 20 --json

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use docload::config::{
    DEFAULT_CHANGE_BUDGET, DEFAULT_DOCUMENT_URL, DEFAULT_OUTPUT_DIR, DEFAULT_SERVER,
};
use docload::{Harness, HarnessConfig};

/// Simulate concurrent co-authoring clients against a document server.
#[derive(Debug, Parser)]
#[command(name = "docload", version, about)]
struct Cli {
    /// Log every frame and request.
    #[arg(long)]
    debug: bool,

    /// Number of simulated users.
    #[arg(long, default_value_t = 1)]
    users: usize,

    /// Documents opened by each user.
    #[arg(long, default_value_t = 1)]
    documents: usize,

    /// WebSocket endpoint of the co-authoring server.
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Document URL sent in the open command.
    #[arg(long = "file", default_value = DEFAULT_DOCUMENT_URL)]
    file: String,

    /// Serve sample documents from this base URL instead of --file.
    #[arg(long)]
    base_url: Option<String>,

    /// Saves each session submits before closing.
    #[arg(long, default_value_t = DEFAULT_CHANGE_BUDGET)]
    changes: u32,

    /// Where downloaded Editor.bin attachments go.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Print the summary as one JSON line.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> HarnessConfig {
        let config = HarnessConfig::new()
            .with_counts(self.users, self.documents)
            .with_server(self.server)
            .with_document_url(self.file)
            .with_change_budget(self.changes)
            .with_output_dir(self.output_dir);
        match self.base_url {
            Some(base) => config.with_base_url(base),
            None => config,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "docload=debug" } else { "docload=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let json = cli.json;
    let harness = Harness::new(cli.into_config());
    harness.run().await;

    if json {
        println!("{}", harness.metrics().report_json());
    } else {
        println!("{}", harness.metrics().report());
    }

    Ok(())
}
