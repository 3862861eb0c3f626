//! Keyed join of geometries with education rows.

use std::collections::HashMap;

use crate::model::{EducationRecord, EnrichedRecord, Fips, GeometryRecord};

/// Indexes education rows by FIPS code. On duplicate codes the first row
/// wins, matching a front-to-back search.
pub fn index_by_fips(education: &[EducationRecord]) -> HashMap<Fips, &EducationRecord> {
    let mut index = HashMap::with_capacity(education.len());
    for record in education {
        index.entry(record.fips).or_insert(record);
    }
    index
}

/// Produces one enriched record per geometry, in geometry order.
///
/// Geometries without an id, or whose id has no education row, keep
/// `education: None`.
pub fn join(geometries: &[GeometryRecord], education: &[EducationRecord]) -> Vec<EnrichedRecord> {
    let index = index_by_fips(education);

    geometries
        .iter()
        .map(|geometry| EnrichedRecord {
            geometry: geometry.clone(),
            education: geometry
                .id
                .and_then(|id| index.get(&id))
                .map(|record| (*record).clone()),
        })
        .collect()
}
