//! Static workflow configuration.

/// Number of results to fetch from the API.
pub const RESULT_COUNT: usize = 20;

/// How long cached result sets stay fresh.
pub const CACHE_MAX_AGE_SECS: u64 = 20;

/// Workflow icon, shipped next to the binary inside the workflow bundle.
pub const VUE_ICON: &str = "icon.png";

/// Icon for the search-the-web fallback entry.
pub const GOOGLE_ICON: &str = "google.png";

/// macOS system info icon, used for the update notification entry.
pub const INFO_ICON: &str =
    "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources/ToolbarInfo.icns";

/// Version tags recognized in the query text.
pub const SUPPORTED_VUE_VERSIONS: &[&str] = &["v2", "v3"];

/// Version used when the query carries no tag.
pub const DEFAULT_VUE_VERSION: &str = "3";

/// Credentials for one hosted search index.
#[derive(Debug, Clone, Copy)]
pub struct AlgoliaIndex {
    pub app_id: &'static str,
    pub search_key: &'static str,
    pub index: &'static str,
}

const VUEJS: AlgoliaIndex = AlgoliaIndex {
    app_id: "ML0LEBN7FQ",
    search_key: "f49cbd92a74532cc55cfbffa5e5a7d01",
    index: "vuejs",
};

/// Index credentials for a resolved documentation version.
///
/// v2 and v3 currently share one index, split by the `version` facet; the
/// lookup keeps the door open for per-version indices.
pub fn index_for(version: &str) -> AlgoliaIndex {
    let _ = version;
    VUEJS
}
