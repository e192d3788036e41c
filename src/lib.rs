pub mod cache;
pub mod config;
pub mod output;
pub mod query;
pub mod search;
pub mod update_check;

use anyhow::Result;
use cache::{Cache, FileCache};
use clap::Parser;
use search::hit::{DisplayRecord, RawHit};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface.
///
/// Alfred hands over the full query as a single positional argument; the
/// overrides exist for scripting and tests.
#[derive(Parser, Debug)]
#[command(
    name = "vuedocs",
    version,
    about = "Search the Vue.js documentation from Alfred"
)]
pub struct Cli {
    /// Raw query text (version tags and search words intermixed)
    pub query: Vec<String>,

    /// Maximum number of results to request
    #[arg(long)]
    pub limit: Option<usize>,

    /// Cache freshness window in seconds
    #[arg(long)]
    pub max_age: Option<u64>,

    /// Override the result cache directory (defaults to platform cache dir)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Override the data dir holding update-check state
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run_with(cli, &mut stdout.lock())
}

/// Full pipeline: parse, cache-or-fetch, normalize, group, emit.
pub fn run_with(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let raw = cli.query.join(" ");
    let mut raw = raw.trim();

    // Tag prefix only. Treat as blank query.
    if raw == "v" {
        raw = "";
    }

    // The notification reads state already on disk; the refresh only feeds
    // the next invocation.
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(update_check::default_data_dir);
    let refresh = update_check::spawn_state_refresh(data_dir.clone());

    let mut items = if raw.is_empty() {
        vec![output::placeholder_item()]
    } else {
        let query = query::parse_query(raw);
        tracing::debug!(phrase = %query.phrase, version = %query.version, "parsed query");

        let limit = cli.limit.unwrap_or(config::RESULT_COUNT);
        let max_age = Duration::from_secs(cli.max_age.unwrap_or(config::CACHE_MAX_AGE_SECS));
        let store = FileCache::new(cli.cache_dir.unwrap_or_else(cache::default_cache_dir));

        let key = cache::cache_key(&query.phrase, &query.version);
        let hits: Vec<RawHit> = store.get_or_compute(&key, max_age, || {
            search::search(&query.phrase, &query.version, limit)
        })?;
        tracing::debug!(
            count = hits.len(),
            phrase = %query.phrase,
            version = %query.version,
            "hits"
        );

        let mut records: Vec<DisplayRecord> = Vec::with_capacity(hits.len());
        for hit in &hits {
            match DisplayRecord::from_hit(hit) {
                Some(record) => records.push(record),
                // No non-empty hierarchy level means no usable title.
                None => tracing::warn!(id = %hit.object_id, "dropping hit with empty hierarchy"),
            }
        }

        if records.is_empty() {
            vec![output::google_fallback_item(&query.phrase)]
        } else {
            let grouped = output::GroupedResults::from_records(records);
            output::grouped_items(&grouped)
        }
    };

    if let Some(update) = update_check::available_update(&data_dir, env!("CARGO_PKG_VERSION"))
        && update.should_show()
    {
        items.insert(0, output::update_item(&update));
    }

    output::emit(out, &items)?;

    // The feedback is already written; this only waits out the state refresh.
    if let Some(handle) = refresh {
        let _ = handle.join();
    }
    Ok(())
}
