//! Read-only summary of a loaded adaptive manifest.

use bridge_traits::engine::{is_time_unset, RawManifest};
use bridge_traits::TrackType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationSetSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub media_type: TrackType,
    pub representation_count: usize,
}

/// What `getManifestInfo` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub period_count: usize,
    /// Milliseconds; 0 when the manifest does not declare a duration.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub dynamic: bool,
    /// Adaptation sets of every period, in period order.
    pub adaptation_sets: Vec<AdaptationSetSummary>,
}

impl ManifestSummary {
    pub fn from_raw(raw: &RawManifest) -> Self {
        let adaptation_sets = raw
            .periods
            .iter()
            .flat_map(|period| period.adaptation_sets.iter())
            .map(|set| AdaptationSetSummary {
                id: set.id,
                media_type: set.track_type,
                representation_count: set.representation_count,
            })
            .collect();

        Self {
            period_count: raw.periods.len(),
            duration_ms: if is_time_unset(raw.duration_ms) {
                0
            } else {
                raw.duration_ms as u64
            },
            dynamic: raw.dynamic,
            adaptation_sets,
        }
    }

    pub fn audio_sets(&self) -> impl Iterator<Item = &AdaptationSetSummary> {
        self.adaptation_sets
            .iter()
            .filter(|set| set.media_type == TrackType::Audio)
    }
}
