//! Output persistence: rendered documents, the classification table and
//! the run summary.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::classify::hex;
use crate::model::Fips;
use crate::pipeline::ChoroplethMap;
use crate::stats::MapSummary;

/// One row of the classification export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRow {
    pub fips: Option<Fips>,
    pub area_name: Option<String>,
    pub state: Option<String>,
    pub bachelors_or_higher: Option<f64>,
    pub bucket: usize,
    pub color: String,
}

/// Logs the summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &MapSummary) {
    debug!("{:#?}", summary);
}

/// Logs the summary as pretty-printed JSON.
pub fn print_json(summary: &MapSummary) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Writes a rendered document, creating parent directories as needed.
pub fn write_document(path: &str, contents: &str) -> Result<()> {
    let path = Path::new(path);
    ensure_parent(path)?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "Document written");
    Ok(())
}

/// Rows in geometry order.
pub fn classification_rows(map: &ChoroplethMap) -> Vec<ClassificationRow> {
    map.regions
        .iter()
        .map(|region| {
            let education = region.record.education.as_ref();
            ClassificationRow {
                fips: region.record.id(),
                area_name: education.map(|e| e.area_name.clone()),
                state: education.map(|e| e.state.clone()),
                bachelors_or_higher: region.record.percentage(),
                bucket: region.bucket,
                color: hex(map.scale.color(region.bucket)),
            }
        })
        .collect()
}

/// Writes the classification table as CSV, replacing any existing file.
/// Returns the number of data rows.
pub fn write_table(path: &str, map: &ChoroplethMap) -> Result<usize> {
    ensure_parent(Path::new(path))?;

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {path}"))?;

    let rows = classification_rows(map);
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path, rows = rows.len(), "Classification table written");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::model::{EducationRecord, EnrichedRecord, GeometryRecord};
    use crate::pipeline::Region;
    use chrono::Utc;
    use std::env;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_map() -> ChoroplethMap {
        let config = MapConfig::default();
        let scale = config.color_scale().unwrap();
        ChoroplethMap {
            config,
            scale,
            regions: vec![
                Region {
                    record: EnrichedRecord {
                        geometry: GeometryRecord::new(Some(1001), Default::default()),
                        education: Some(EducationRecord {
                            fips: 1001,
                            area_name: "Autauga County".to_string(),
                            state: "AL".to_string(),
                            bachelors_or_higher: Some(24.4),
                        }),
                    },
                    bucket: 2,
                    path: String::new(),
                },
                Region {
                    record: EnrichedRecord {
                        geometry: GeometryRecord::new(Some(1005), Default::default()),
                        education: None,
                    },
                    bucket: 0,
                    path: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&MapSummary::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let summary = MapSummary {
            generated_at: Utc::now(),
            ..Default::default()
        };
        print_json(&summary).unwrap();
    }

    #[test]
    fn test_classification_rows_follow_regions() {
        let map = sample_map();
        let rows = classification_rows(&map);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fips, Some(1001));
        assert_eq!(rows[0].area_name.as_deref(), Some("Autauga County"));
        assert_eq!(rows[0].bucket, 2);
        assert_eq!(rows[0].color, hex(map.scale.color(2)));
        assert_eq!(rows[1].area_name, None);
        assert_eq!(rows[1].bucket, 0);
    }

    #[test]
    fn test_write_table_writes_header_and_rows() {
        let path = temp_path("edu_choropleth_test_table.csv");
        let _ = fs::remove_file(&path);

        let written = write_table(&path, &sample_map()).unwrap();
        assert_eq!(written, 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "fips,area_name,state,bachelors_or_higher,bucket,color"
        );
        assert!(lines[1].starts_with("1001,Autauga County,AL,24.4,2,#"));
        assert!(lines[2].starts_with("1005,,,,0,#"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_table_overwrites() {
        let path = temp_path("edu_choropleth_test_overwrite.csv");
        write_table(&path, &sample_map()).unwrap();
        write_table(&path, &sample_map()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_document_creates_parent_dirs() {
        let dir = temp_path("edu_choropleth_test_docs");
        let path = format!("{dir}/nested/map.svg");
        let _ = fs::remove_dir_all(&dir);

        write_document(&path, "<svg/>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg/>");

        fs::remove_dir_all(&dir).unwrap();
    }
}
