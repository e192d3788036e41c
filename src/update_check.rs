//! Release notification against the workflow's GitHub repo.
//!
//! The notification itself answers from state already on disk, so emission
//! never waits on the network. A background refresh polls GitHub on a weekly
//! cadence with a short timeout and silent failure when offline; whatever it
//! records feeds the next invocation.

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// How often to refresh release state (7 days, matching the workflow's
/// original update settings).
const CHECK_INTERVAL_SECS: u64 = 7 * 24 * 3600;

/// Timeout for HTTP requests (the refresh runs off the emission path)
const HTTP_TIMEOUT_SECS: u64 = 5;

/// GitHub repo for release checks
const GITHUB_REPO: &str = "techouse/alfred-vue-docs";

/// Escape hatch for CI and restricted environments. Gates the network
/// refresh; a release already recorded on disk still notifies.
fn updates_disabled() -> bool {
    dotenvy::var("VUEDOCS_SKIP_UPDATE").is_ok() || dotenvy::var("CI").is_ok()
}

/// Persistent state for the update checker.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateState {
    /// Unix timestamp of last successful check
    pub last_check_ts: i64,
    /// Latest release seen by a previous refresh (tag without leading `v`)
    #[serde(default)]
    pub latest_version: Option<String>,
    /// Release page recorded alongside `latest_version`
    #[serde(default)]
    pub release_url: Option<String>,
}

impl UpdateState {
    pub fn load(data_dir: &Path) -> Self {
        match std::fs::read_to_string(state_path(data_dir)) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = state_path(data_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating update state directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Check if enough time has passed since last check
    pub fn should_check(&self) -> bool {
        (now_unix() - self.last_check_ts) >= CHECK_INTERVAL_SECS as i64
    }

    /// Mark that we just checked
    pub fn mark_checked(&mut self) {
        self.last_check_ts = now_unix();
    }
}

/// Information about an available update
#[derive(Debug, Clone)]
pub struct UpdateInfo {
    /// Latest version available
    pub latest_version: String,
    /// Current running version
    pub current_version: String,
    /// URL to release notes
    pub release_url: String,
    /// Whether latest is newer than current
    pub is_newer: bool,
}

impl UpdateInfo {
    pub fn should_show(&self) -> bool {
        self.is_newer
    }
}

/// GitHub release API response (minimal fields)
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    html_url: String,
}

/// Update info from persisted state. No network, no waiting.
///
/// Returns None until a refresh has recorded a release, or when the
/// recorded version strings do not parse.
pub fn available_update(data_dir: &Path, current_version: &str) -> Option<UpdateInfo> {
    update_from_state(&UpdateState::load(data_dir), current_version)
}

fn update_from_state(state: &UpdateState, current_version: &str) -> Option<UpdateInfo> {
    let latest_str = state.latest_version.as_deref()?.trim_start_matches('v');
    let release_url = state.release_url.clone()?;

    let latest = match Version::parse(latest_str) {
        Ok(v) => v,
        Err(e) => {
            debug!("update check: invalid recorded version '{latest_str}': {e}");
            return None;
        }
    };
    let current = match Version::parse(current_version) {
        Ok(v) => v,
        Err(e) => {
            debug!("update check: invalid current version '{current_version}': {e}");
            return None;
        }
    };

    Some(UpdateInfo {
        latest_version: latest_str.to_string(),
        current_version: current_version.to_string(),
        release_url,
        is_newer: latest > current,
    })
}

/// Refresh persisted release state for the next run.
///
/// Skips when the cadence window has not elapsed. The check timestamp is
/// recorded up front so a failing fetch is not retried on every invocation.
pub fn refresh_state(data_dir: &Path) {
    let mut state = UpdateState::load(data_dir);
    if !state.should_check() {
        debug!("update refresh: skipping, checked recently");
        return;
    }

    state.mark_checked();
    if let Err(e) = state.save(data_dir) {
        warn!("update refresh: failed to save state: {e}");
    }

    match fetch_latest_release() {
        Ok(release) => {
            state.latest_version = Some(release.tag_name.trim_start_matches('v').to_string());
            state.release_url = Some(release.html_url);
            if let Err(e) = state.save(data_dir) {
                warn!("update refresh: failed to record release: {e}");
            }
        }
        Err(e) => debug!("update refresh: fetch failed (offline?): {e}"),
    }
}

/// Run the state refresh on a background thread.
/// None when refreshes are disabled via environment.
pub fn spawn_state_refresh(data_dir: PathBuf) -> Option<std::thread::JoinHandle<()>> {
    if updates_disabled() {
        return None;
    }
    Some(std::thread::spawn(move || refresh_state(&data_dir)))
}

/// Fetch latest release from GitHub API
fn fetch_latest_release() -> Result<GitHubRelease> {
    let url = format!("https://api.github.com/repos/{GITHUB_REPO}/releases/latest");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(concat!("vuedocs/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")?;

    let response = client
        .get(&url)
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .context("fetching release")?;

    if !response.status().is_success() {
        anyhow::bail!("GitHub API returned {}", response.status());
    }

    response
        .json::<GitHubRelease>()
        .context("parsing release JSON")
}

pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "techouse", "alfred-vue-docs").map_or_else(
        || PathBuf::from(".data"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn state_path(data_dir: &Path) -> PathBuf {
    data_dir.join("update_state.json")
}

/// Current unix timestamp
fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_should_check_respects_cadence() {
        let mut state = UpdateState::default();
        assert!(state.should_check()); // Fresh state should check

        state.mark_checked();
        assert!(!state.should_check()); // Just checked

        state.last_check_ts = now_unix() - (CHECK_INTERVAL_SECS as i64 / 2);
        assert!(!state.should_check()); // Halfway through the window

        state.last_check_ts = now_unix() - CHECK_INTERVAL_SECS as i64 - 1;
        assert!(state.should_check()); // Window elapsed
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let state = UpdateState {
            last_check_ts: 1234567890,
            latest_version: Some("1.5.0".to_string()),
            release_url: Some("https://example.com/rel".to_string()),
        };
        state.save(dir.path()).unwrap();

        let loaded = UpdateState::load(dir.path());
        assert_eq!(loaded.last_check_ts, 1234567890);
        assert_eq!(loaded.latest_version.as_deref(), Some("1.5.0"));
        assert_eq!(loaded.release_url.as_deref(), Some("https://example.com/rel"));
    }

    #[test]
    fn missing_state_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = UpdateState::load(dir.path());
        assert_eq!(loaded.last_check_ts, 0);
        assert!(loaded.latest_version.is_none());
    }

    #[test]
    fn legacy_state_without_release_fields_loads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            state_path(dir.path()),
            r#"{"last_check_ts": 1234567890}"#,
        )
        .unwrap();
        let loaded = UpdateState::load(dir.path());
        assert_eq!(loaded.last_check_ts, 1234567890);
        assert!(loaded.latest_version.is_none());
    }

    #[test]
    fn available_update_comes_from_persisted_state() {
        let state = UpdateState {
            last_check_ts: 0,
            latest_version: Some("99.0.0".to_string()),
            release_url: Some("https://example.com/rel".to_string()),
        };
        let info = update_from_state(&state, "1.4.0").unwrap();
        assert!(info.is_newer);
        assert!(info.should_show());
        assert_eq!(info.latest_version, "99.0.0");
        assert_eq!(info.release_url, "https://example.com/rel");
    }

    #[test]
    fn recorded_tag_prefix_is_tolerated() {
        let state = UpdateState {
            last_check_ts: 0,
            latest_version: Some("v99.0.0".to_string()),
            release_url: Some("https://example.com/rel".to_string()),
        };
        let info = update_from_state(&state, "1.4.0").unwrap();
        assert_eq!(info.latest_version, "99.0.0");
    }

    #[test]
    fn current_or_older_release_does_not_show() {
        for recorded in ["1.4.0", "1.3.9"] {
            let state = UpdateState {
                last_check_ts: 0,
                latest_version: Some(recorded.to_string()),
                release_url: Some("https://example.com/rel".to_string()),
            };
            let info = update_from_state(&state, "1.4.0").unwrap();
            assert!(!info.should_show(), "recorded {recorded}");
        }
    }

    #[test]
    fn no_recorded_release_yields_nothing() {
        assert!(update_from_state(&UpdateState::default(), "1.4.0").is_none());
    }

    #[test]
    fn invalid_recorded_version_yields_nothing() {
        let state = UpdateState {
            last_check_ts: 0,
            latest_version: Some("not-a-version".to_string()),
            release_url: Some("https://example.com/rel".to_string()),
        };
        assert!(update_from_state(&state, "1.4.0").is_none());
    }

    #[test]
    fn version_comparison_scenarios() {
        let cases = [
            ("1.4.0", "1.4.1", true),
            ("1.4.0", "1.5.0", true),
            ("1.4.0", "2.0.0", true),
            ("1.4.0", "1.4.0", false),
            ("1.4.0", "1.3.9", false),
        ];
        for (current, latest, expected) in cases {
            let current = Version::parse(current).unwrap();
            let latest = Version::parse(latest).unwrap();
            assert_eq!(latest > current, expected, "{current} -> {latest}");
        }
    }
}
