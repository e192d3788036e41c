use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout carries the script-filter JSON, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    vue_docs_search::run()
}
