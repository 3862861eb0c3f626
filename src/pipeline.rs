//! Fetch → join → project/classify, as one explicit pipeline over injected
//! data sources.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::classify::{ColorScale, LegendEntry};
use crate::config::MapConfig;
use crate::fetch::{DataSource, fetch_json};
use crate::join::join;
use crate::model::{EducationRecord, EnrichedRecord, Fips};
use crate::projection::{ScreenTransform, path_data};
use crate::topology::Topology;

/// Both parsed inputs.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub education: Vec<EducationRecord>,
    pub topology: Topology,
}

/// A joined region ready to draw.
#[derive(Debug, Clone)]
pub struct Region {
    pub record: EnrichedRecord,
    pub bucket: usize,
    /// SVG path data in screen coordinates.
    pub path: String,
}

/// The classified, projected map.
#[derive(Debug, Clone)]
pub struct ChoroplethMap {
    pub config: MapConfig,
    pub scale: ColorScale,
    pub regions: Vec<Region>,
}

impl ChoroplethMap {
    /// `(id, bucket)` per region, in geometry order.
    pub fn buckets(&self) -> Vec<(Option<Fips>, usize)> {
        self.regions
            .iter()
            .map(|r| (r.record.id(), r.bucket))
            .collect()
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.scale.legend()
    }
}

/// Fetches both datasets concurrently. The first failure aborts the load.
#[tracing::instrument(
    skip_all,
    fields(education = %education_src.describe(), topology = %topology_src.describe())
)]
pub async fn load_datasets(
    education_src: &dyn DataSource,
    topology_src: &dyn DataSource,
) -> Result<Datasets> {
    let (education, topology) = tokio::try_join!(
        fetch_json::<Vec<EducationRecord>>(education_src),
        fetch_json::<Topology>(topology_src),
    )?;

    info!(
        education_records = education.len(),
        arcs = topology.arcs.len(),
        objects = topology.objects.len(),
        "Datasets loaded"
    );
    Ok(Datasets {
        education,
        topology,
    })
}

/// `(id, bucket)` for every record.
pub fn classify(records: &[EnrichedRecord], scale: &ColorScale) -> Vec<(Option<Fips>, usize)> {
    records
        .iter()
        .map(|r| (r.id(), scale.classify(r.percentage())))
        .collect()
}

/// Joins, classifies and projects the loaded data. Synchronous and pure.
#[tracing::instrument(skip_all, fields(object = %config.object))]
pub fn build_map(data: &Datasets, config: &MapConfig) -> Result<ChoroplethMap> {
    let scale = config.color_scale()?;
    let geometries = data.topology.geometry_records(&config.object)?;
    let arcs = data.topology.arc_table();
    debug!(geometries = geometries.len(), arcs = arcs.len(), "Decoding shapes");

    let records = join(&geometries, &data.education);
    let shapes = records
        .iter()
        .map(|r| arcs.multi_polygon(&r.geometry.geometry))
        .collect::<Result<Vec<_>>>()?;

    let transform = ScreenTransform::for_shapes(config.projection, &shapes, &config.canvas);
    let buckets = classify(&records, &scale);

    let regions: Vec<Region> = records
        .into_iter()
        .zip(&shapes)
        .zip(buckets)
        .map(|((record, shape), (_, bucket))| Region {
            record,
            bucket,
            path: path_data(&transform.project(shape)),
        })
        .collect();

    let unmatched = regions.iter().filter(|r| r.record.education.is_none()).count();
    let missing_value = regions
        .iter()
        .filter(|r| r.record.education.is_some() && r.record.percentage().is_none())
        .count();
    if missing_value > 0 {
        warn!(missing_value, "Matched records without a usable percentage, classified as 0");
    }
    info!(
        regions = regions.len(),
        unmatched,
        empty_shapes = shapes.iter().filter(|s| s.0.is_empty()).count(),
        "Map built"
    );

    Ok(ChoroplethMap {
        config: config.clone(),
        scale,
        regions,
    })
}

/// Full pipeline: load both sources, then build the map.
pub async fn run(
    education: &dyn DataSource,
    topology: &dyn DataSource,
    config: &MapConfig,
) -> Result<ChoroplethMap> {
    let data = load_datasets(education, topology).await?;
    build_map(&data, config)
}
