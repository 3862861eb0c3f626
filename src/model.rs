//! Records flowing through the join.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::topology::TopoGeometry;

/// Numeric U.S. county code; the join key between both datasets.
pub type Fips = u32;

/// One row of the education dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    #[serde(deserialize_with = "lenient_fips")]
    pub fips: Fips,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub area_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    /// Share of adults holding a bachelor's degree or higher, in percent.
    /// `None` when the field is missing or not a number.
    #[serde(
        rename = "bachelorsOrHigher",
        default,
        deserialize_with = "lenient_percentage"
    )]
    pub bachelors_or_higher: Option<f64>,
}

impl EducationRecord {
    /// Text shown when hovering the county.
    pub fn tooltip(&self) -> String {
        format!(
            "{}, {}: {}%",
            self.area_name,
            self.state,
            self.bachelors_or_higher.unwrap_or(0.0)
        )
    }
}

/// Reads a county code from an integral JSON number (`1001`, `1001.0`) or a
/// numeric string (`"01001"`).
pub fn fips_from_value(value: &Value) -> Option<Fips> {
    match value {
        Value::Number(n) => {
            let v = n.as_f64()?;
            if v.fract() == 0.0 && (0.0..=f64::from(Fips::MAX)).contains(&v) {
                Some(v as Fips)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_fips<'de, D>(deserializer: D) -> Result<Fips, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    fips_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid fips code: {value}")))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts numbers and numeric strings; anything else becomes `None`.
fn lenient_percentage<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A region shape taken from the topology, keyed by its identifier.
#[derive(Debug, Clone, Default)]
pub struct GeometryRecord {
    /// `None` when the geometry has no numeric id; such records never join.
    pub id: Option<Fips>,
    pub geometry: TopoGeometry,
}

impl GeometryRecord {
    pub fn new(id: Option<Fips>, geometry: TopoGeometry) -> Self {
        Self { id, geometry }
    }
}

/// A geometry together with its matching education row, if any.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub geometry: GeometryRecord,
    pub education: Option<EducationRecord>,
}

impl EnrichedRecord {
    pub fn id(&self) -> Option<Fips> {
        self.geometry.id
    }

    /// The statistic to classify; `None` when unmatched or missing.
    pub fn percentage(&self) -> Option<f64> {
        self.education
            .as_ref()
            .and_then(|e| e.bachelors_or_higher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_record_uses_source_field_names() {
        let json = r#"{"fips":1001,"state":"AL","area_name":"Autauga County","bachelorsOrHigher":21.9}"#;
        let record: EducationRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.fips, 1001);
        assert_eq!(record.area_name, "Autauga County");
        assert_eq!(record.state, "AL");
        assert_eq!(record.bachelors_or_higher, Some(21.9));
    }

    #[test]
    fn test_missing_or_malformed_percentage_is_none() {
        let missing: EducationRecord =
            serde_json::from_str(r#"{"fips":1,"state":"AL","area_name":"A"}"#).unwrap();
        let null: EducationRecord = serde_json::from_str(
            r#"{"fips":1,"state":"AL","area_name":"A","bachelorsOrHigher":null}"#,
        )
        .unwrap();
        let text: EducationRecord = serde_json::from_str(
            r#"{"fips":1,"state":"AL","area_name":"A","bachelorsOrHigher":"n/a"}"#,
        )
        .unwrap();

        assert_eq!(missing.bachelors_or_higher, None);
        assert_eq!(null.bachelors_or_higher, None);
        assert_eq!(text.bachelors_or_higher, None);
    }

    #[test]
    fn test_numeric_string_percentage_is_parsed() {
        let record: EducationRecord = serde_json::from_str(
            r#"{"fips":1,"state":"AL","area_name":"A","bachelorsOrHigher":" 12.5 "}"#,
        )
        .unwrap();
        assert_eq!(record.bachelors_or_higher, Some(12.5));
    }

    #[test]
    fn test_fips_accepts_integral_floats_and_strings() {
        let float: EducationRecord = serde_json::from_str(
            r#"{"fips":1001.0,"state":"AL","area_name":"A","bachelorsOrHigher":21.9}"#,
        )
        .unwrap();
        let text: EducationRecord = serde_json::from_str(
            r#"{"fips":"01001","state":"AL","area_name":"A","bachelorsOrHigher":21.9}"#,
        )
        .unwrap();

        assert_eq!(float.fips, 1001);
        assert_eq!(text.fips, 1001);
    }

    #[test]
    fn test_unusable_fips_is_rejected() {
        for fips in ["1001.5", "-3", "\"abc\"", "null", "true"] {
            let json = format!(r#"{{"fips":{fips},"state":"AL","area_name":"A"}}"#);
            let err = serde_json::from_str::<EducationRecord>(&json).unwrap_err();
            assert!(err.to_string().contains("fips"), "{fips}: {err}");
        }
    }

    #[test]
    fn test_null_or_missing_names_default_to_empty() {
        let null: EducationRecord = serde_json::from_str(
            r#"{"fips":1001,"state":null,"area_name":null,"bachelorsOrHigher":21.9}"#,
        )
        .unwrap();
        let missing: EducationRecord =
            serde_json::from_str(r#"{"fips":1001,"bachelorsOrHigher":21.9}"#).unwrap();

        assert_eq!(null.state, "");
        assert_eq!(null.area_name, "");
        assert_eq!(missing, null);
        assert_eq!(missing.bachelors_or_higher, Some(21.9));
    }

    #[test]
    fn test_fips_from_value() {
        use serde_json::json;
        assert_eq!(fips_from_value(&json!(1001)), Some(1001));
        assert_eq!(fips_from_value(&json!(1001.0)), Some(1001));
        assert_eq!(fips_from_value(&json!(" 01001 ")), Some(1001));
        assert_eq!(fips_from_value(&json!(1001.25)), None);
        assert_eq!(fips_from_value(&json!(-1)), None);
        assert_eq!(fips_from_value(&json!(1e12)), None);
        assert_eq!(fips_from_value(&json!(null)), None);
    }

    #[test]
    fn test_tooltip_text() {
        let record = EducationRecord {
            fips: 1001,
            area_name: "Autauga County".to_string(),
            state: "AL".to_string(),
            bachelors_or_higher: Some(21.9),
        };
        assert_eq!(record.tooltip(), "Autauga County, AL: 21.9%");
    }

    #[test]
    fn test_unmatched_record_has_no_percentage() {
        let record = EnrichedRecord {
            geometry: GeometryRecord::new(Some(1001), TopoGeometry::default()),
            education: None,
        };
        assert_eq!(record.id(), Some(1001));
        assert_eq!(record.percentage(), None);
    }
}
