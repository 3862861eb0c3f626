//! TopoJSON decoding.
//!
//! A topology stores every boundary once as an *arc*; polygons reference arcs
//! by index, with a negative index `i` meaning arc `!i` traversed backwards.
//! Quantized topologies delta-encode arc positions and carry a `transform`
//! mapping the integer grid back to real coordinates.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::Value;

use crate::model::{Fips, GeometryRecord, fips_from_value};

/// Quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// Top-level TopoJSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, TopoGeometry>,
}

/// A geometry object with its optional identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopoGeometry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub shape: Shape,
}

/// Geometry kinds this crate draws. Points and lines decode to nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    Polygon {
        arcs: Vec<Vec<i64>>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
    },
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    #[default]
    #[serde(other)]
    Unsupported,
}

impl TopoGeometry {
    /// Numeric identifier. Accepts integral JSON numbers and numeric
    /// strings such as `"01001"`.
    pub fn fips(&self) -> Option<Fips> {
        self.id.as_ref().and_then(fips_from_value)
    }
}

impl Topology {
    /// Looks up a named object such as `counties`.
    pub fn object(&self, name: &str) -> Result<&TopoGeometry> {
        self.objects.get(name).ok_or_else(|| {
            let mut known: Vec<_> = self.objects.keys().map(String::as_str).collect();
            known.sort_unstable();
            anyhow!(
                "topology has no object '{name}' (available: {})",
                known.join(", ")
            )
        })
    }

    /// Splits a named object into one record per member geometry, in source
    /// order. A non-collection object yields a single record.
    pub fn geometry_records(&self, name: &str) -> Result<Vec<GeometryRecord>> {
        let object = self.object(name)?;
        let records = match &object.shape {
            Shape::GeometryCollection { geometries } => geometries
                .iter()
                .map(|g| GeometryRecord::new(g.fips(), g.clone()))
                .collect(),
            _ => vec![GeometryRecord::new(object.fips(), object.clone())],
        };
        Ok(records)
    }

    /// Decodes every arc into absolute coordinates.
    pub fn arc_table(&self) -> ArcTable {
        let arcs = self
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, self.transform.as_ref()))
            .collect();
        ArcTable { arcs }
    }
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<&Transform>) -> Vec<Coord<f64>> {
    let positions = arc.iter().filter(|p| p.len() >= 2);
    match transform {
        Some(t) => {
            let (mut x, mut y) = (0.0, 0.0);
            positions
                .map(|p| {
                    x += p[0];
                    y += p[1];
                    Coord {
                        x: x * t.scale[0] + t.translate[0],
                        y: y * t.scale[1] + t.translate[1],
                    }
                })
                .collect()
        }
        None => positions.map(|p| Coord { x: p[0], y: p[1] }).collect(),
    }
}

/// Arcs of a topology in absolute coordinates.
#[derive(Debug, Clone)]
pub struct ArcTable {
    arcs: Vec<Vec<Coord<f64>>>,
}

impl ArcTable {
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Converts a geometry into polygons. Unsupported kinds give an empty
    /// shape; nested collections are flattened.
    pub fn multi_polygon(&self, geometry: &TopoGeometry) -> Result<MultiPolygon<f64>> {
        let mut polygons = Vec::new();
        self.collect_polygons(geometry, &mut polygons)?;
        Ok(MultiPolygon::new(polygons))
    }

    fn collect_polygons(&self, geometry: &TopoGeometry, out: &mut Vec<Polygon<f64>>) -> Result<()> {
        match &geometry.shape {
            Shape::Polygon { arcs } => {
                if let Some(polygon) = self.polygon(arcs)? {
                    out.push(polygon);
                }
            }
            Shape::MultiPolygon { arcs } => {
                for rings in arcs {
                    if let Some(polygon) = self.polygon(rings)? {
                        out.push(polygon);
                    }
                }
            }
            Shape::GeometryCollection { geometries } => {
                for g in geometries {
                    self.collect_polygons(g, out)?;
                }
            }
            Shape::Unsupported => {}
        }
        Ok(())
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Option<Polygon<f64>>> {
        let mut rings = rings.iter();
        let Some(exterior) = rings.next() else {
            return Ok(None);
        };
        let exterior = self.ring(exterior)?;
        let interiors = rings.map(|r| self.ring(r)).collect::<Result<Vec<_>>>()?;
        Ok(Some(Polygon::new(exterior, interiors)))
    }

    /// Stitches arcs into one ring, dropping the shared joint between
    /// consecutive arcs.
    pub fn ring(&self, indices: &[i64]) -> Result<LineString<f64>> {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        for &index in indices {
            let (arc_index, reversed) = if index < 0 {
                (!index, true)
            } else {
                (index, false)
            };
            let arc = usize::try_from(arc_index)
                .ok()
                .and_then(|i| self.arcs.get(i))
                .with_context(|| {
                    format!("arc index {index} out of range ({} arcs)", self.arcs.len())
                })?;

            let skip = usize::from(!coords.is_empty());
            if reversed {
                coords.extend(arc.iter().rev().skip(skip).copied());
            } else {
                coords.extend(arc.iter().skip(skip).copied());
            }
        }
        if coords.is_empty() && !indices.is_empty() {
            bail!("ring {indices:?} decoded to no coordinates");
        }
        Ok(LineString::new(coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit squares sharing the edge x=10, quantized with scale 1.
    const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [1, 1], "translate": [0, 0]},
        "arcs": [
            [[10, 0], [0, 10]],
            [[10, 10], [-10, 0], [0, -10], [10, 0]],
            [[10, 0], [10, 0], [0, 10], [-10, 0]]
        ],
        "objects": {
            "counties": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": 1001, "arcs": [[0, 1]]},
                    {"type": "Polygon", "id": "01003", "arcs": [[2, -1]]},
                    {"type": "Point", "coordinates": [1, 1]}
                ]
            }
        }
    }"#;

    fn topology() -> Topology {
        serde_json::from_str(TWO_SQUARES).unwrap()
    }

    fn xy(line: &LineString<f64>) -> Vec<(f64, f64)> {
        line.coords().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let table = topology().arc_table();
        assert_eq!(table.len(), 3);

        let ring = table.ring(&[1]).unwrap();
        assert_eq!(
            xy(&ring),
            vec![(10.0, 10.0), (0.0, 10.0), (0.0, 0.0), (10.0, 0.0)]
        );
    }

    #[test]
    fn test_transform_scales_and_translates() {
        let topo: Topology = serde_json::from_str(
            r#"{"transform":{"scale":[0.5,2],"translate":[100,-50]},
                "arcs":[[[2,1],[2,1]]],"objects":{}}"#,
        )
        .unwrap();
        let ring = topo.arc_table().ring(&[0]).unwrap();
        assert_eq!(xy(&ring), vec![(101.0, -48.0), (102.0, -46.0)]);
    }

    #[test]
    fn test_unquantized_arcs_are_absolute() {
        let topo: Topology =
            serde_json::from_str(r#"{"arcs":[[[1.5,2.5],[3.5,4.5]]],"objects":{}}"#).unwrap();
        let ring = topo.arc_table().ring(&[0]).unwrap();
        assert_eq!(xy(&ring), vec![(1.5, 2.5), (3.5, 4.5)]);
    }

    #[test]
    fn test_ring_stitches_without_duplicate_joints() {
        let table = topology().arc_table();
        let ring = table.ring(&[0, 1]).unwrap();
        assert_eq!(
            xy(&ring),
            vec![
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
                (10.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_negative_index_reverses_arc() {
        let table = topology().arc_table();
        let ring = table.ring(&[-1]).unwrap();
        assert_eq!(xy(&ring), vec![(10.0, 10.0), (10.0, 0.0)]);

        let ring = table.ring(&[2, -1]).unwrap();
        assert_eq!(ring.0.first(), ring.0.last());
        assert_eq!(ring.0.len(), 5);
    }

    #[test]
    fn test_out_of_range_arc_is_an_error() {
        let table = topology().arc_table();
        assert!(table.ring(&[7]).is_err());
        assert!(table.ring(&[-9]).is_err());
    }

    #[test]
    fn test_geometry_records_keep_order_and_parse_ids() {
        let records = topology().geometry_records("counties").unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1001), Some(1003), None]);
    }

    #[test]
    fn test_float_ids_and_extra_members_are_accepted() {
        let topo: Topology = serde_json::from_str(
            r#"{"type":"Topology","bbox":[0,0,10,10],"arcs":[[[0,0],[1,0],[1,1],[0,0]]],
                "objects":{"counties":{"type":"GeometryCollection","geometries":[
                    {"type":"Polygon","id":1001.0,"properties":{"name":"Autauga"},"arcs":[[0]]},
                    {"type":"Polygon","id":1003.5,"arcs":[[0]]}
                ]}}}"#,
        )
        .unwrap();
        let ids: Vec<_> = topo
            .geometry_records("counties")
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![Some(1001), None]);
    }

    #[test]
    fn test_missing_object_lists_available_names() {
        let err = topology().geometry_records("states").unwrap_err();
        assert!(err.to_string().contains("counties"));
    }

    #[test]
    fn test_multi_polygon_from_geometries() {
        let topo = topology();
        let table = topo.arc_table();
        let records = topo.geometry_records("counties").unwrap();

        let square = table.multi_polygon(&records[0].geometry).unwrap();
        assert_eq!(square.0.len(), 1);
        assert_eq!(square.0[0].exterior().0.len(), 5);

        let point = table.multi_polygon(&records[2].geometry).unwrap();
        assert!(point.0.is_empty());
    }

    #[test]
    fn test_multi_polygon_with_hole() {
        let topo: Topology = serde_json::from_str(
            r#"{"arcs":[
                    [[0,0],[10,0],[10,10],[0,10],[0,0]],
                    [[2,2],[2,4],[4,4],[2,2]]
                ],
                "objects":{"shape":{"type":"MultiPolygon","id":7,"arcs":[[[0],[1]]]}}}"#,
        )
        .unwrap();
        let records = topo.geometry_records("shape").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(7));

        let shape = topo.arc_table().multi_polygon(&records[0].geometry).unwrap();
        assert_eq!(shape.0.len(), 1);
        assert_eq!(shape.0[0].interiors().len(), 1);
    }
}
