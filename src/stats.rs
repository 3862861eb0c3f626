use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::ChoroplethMap;

/// Run summary logged after a map is built.
#[derive(Debug, Default, Serialize)]
pub struct MapSummary {
    pub generated_at: DateTime<Utc>,
    pub geometries: usize,
    pub matched: usize,
    pub unmatched: usize,
    // matched rows whose percentage was absent or not numeric
    pub missing_value: usize,
    pub min_pct: f64,
    pub max_pct: f64,
    pub bucket_counts: Vec<usize>,
}

impl MapSummary {
    /// Summarizes a built map. Min/max treat absent values as 0.
    pub fn from_map(map: &ChoroplethMap) -> Self {
        let mut s = MapSummary {
            generated_at: Utc::now(),
            geometries: map.regions.len(),
            bucket_counts: vec![0; map.scale.bucket_count()],
            ..Default::default()
        };

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for region in &map.regions {
            match &region.record.education {
                Some(e) => {
                    s.matched += 1;
                    if e.bachelors_or_higher.is_none() {
                        s.missing_value += 1;
                    }
                }
                None => s.unmatched += 1,
            }

            let value = region
                .record
                .percentage()
                .filter(|v| !v.is_nan())
                .unwrap_or(0.0);
            min = min.min(value);
            max = max.max(value);

            if let Some(count) = s.bucket_counts.get_mut(region.bucket) {
                *count += 1;
            }
        }

        if !map.regions.is_empty() {
            s.min_pct = min;
            s.max_pct = max;
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of geometries that found an education row.
    pub fn match_pct(&self) -> f64 {
        Self::pct(self.matched, self.geometries)
    }
}
