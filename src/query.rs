//! Free-text query parsing.

use crate::config;

/// Parsed input: search phrase plus resolved documentation version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub phrase: String,
    pub version: String,
}

/// Split raw query text into a phrase and a version selector.
///
/// Tokens exactly matching a supported tag ("v2", "v3") pick the version,
/// leading `v` stripped; every other token stays in the phrase, order
/// preserved. Unrecognized tags like "v5" are ordinary phrase words.
pub fn parse_query(raw: &str) -> Query {
    let mut version = config::DEFAULT_VUE_VERSION.to_string();
    let mut words: Vec<&str> = Vec::new();

    for word in raw.split(' ') {
        if config::SUPPORTED_VUE_VERSIONS.contains(&word) {
            version = word.trim_start_matches('v').to_string();
        } else {
            words.push(word);
        }
    }

    Query {
        phrase: words.join(" "),
        version,
    }
}
