//! Raw search hits and their normalized display form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One matched document fragment, as the API returns it.
///
/// `hierarchy` maps breadcrumb levels "lvl0".."lvl6" to optional labels;
/// deeper levels may be absent or null. The BTreeMap keeps levels in label
/// order, which for single-digit levels is depth order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub hierarchy: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub content: Option<String>,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// UI-ready form of one hit. Derived once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub id: String,
    /// Deepest non-empty hierarchy label.
    pub title: String,
    /// Breadcrumb trail above the title level, shallowest first.
    pub trail: Vec<String>,
    /// Trail joined with " > ", present when the raw hierarchy map carried
    /// more than one entry (empty entries included, matching upstream UX).
    pub subtitle: Option<String>,
    pub url: String,
    pub kind: Option<String>,
}

impl DisplayRecord {
    /// Normalize a hit. `None` when every hierarchy level is empty, in which
    /// case no usable title exists and the hit is dropped.
    pub fn from_hit(hit: &RawHit) -> Option<Self> {
        let title = hit
            .hierarchy
            .iter()
            .rev()
            .find_map(|(_, value)| value.as_deref().filter(|v| !v.is_empty()))?
            .to_string();

        let mut trail: Vec<String> = hit
            .hierarchy
            .values()
            .filter_map(|value| value.as_deref().filter(|v| !v.is_empty()))
            .map(str::to_string)
            .collect();
        // The deepest non-empty level is the title, not part of the trail.
        trail.pop();

        let subtitle = (hit.hierarchy.len() > 1).then(|| trail.join(" > "));

        Some(Self {
            id: hit.object_id.clone(),
            title,
            trail,
            subtitle,
            url: hit.url.clone(),
            kind: hit.kind.clone(),
        })
    }
}
