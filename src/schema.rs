//! Field and group names used by the known DETECT dataset families.
//!
//! Every lookup is a priority list: the first name present in the file
//! wins. Resolution happens once per file and the loaders only ever see
//! the resolved names.

use crate::error::{AppError, Result};
use crate::source::DetectSource;

pub const INFO_GROUP: &str = "Info";

/// Location identifier: river nodes first, then river reaches
pub const ID_FIELDS: &[&str] = &["node_id", "reach_id"];
pub const X_FIELDS: &[&str] = &["x", "x_reach"];
pub const Y_FIELDS: &[&str] = &["y", "y_reach"];
pub const NAME_FIELDS: &[&str] = &["river_name"];

/// Dataset-family groups holding the per-location series
pub const SERIES_GROUPS: &[&str] = &["LakeDB", "SWOTDB", "AltDB"];

pub const TIME_FIELD: &str = "time";

/// Resolved variable names inside the `Info` group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoFields {
    pub id: String,
    pub name: Option<String>,
    pub x: String,
    pub y: String,
}

/// Resolved variable names inside one per-location series subgroup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesFields {
    pub time: String,
    pub value: String,
}

fn first_present(available: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|c| available.iter().any(|a| a == *c))
        .map(|c| c.to_string())
}

fn require(available: &[String], candidates: &[&str], group: &str) -> Result<String> {
    first_present(available, candidates).ok_or_else(|| AppError::MissingVariable {
        group: group.to_string(),
        candidates: candidates.join(", "),
    })
}

impl InfoFields {
    /// Resolve the metadata variable names for the `Info` group at `path`
    pub fn resolve<S: DetectSource>(source: &S, path: &str) -> Result<Self> {
        let available = source.variables(path)?;
        Ok(Self {
            id: require(&available, ID_FIELDS, path)?,
            name: first_present(&available, NAME_FIELDS),
            x: require(&available, X_FIELDS, path)?,
            y: require(&available, Y_FIELDS, path)?,
        })
    }
}

impl SeriesFields {
    /// The first declared variable is the time axis and the second the
    /// measured quantity. When `time` is declared second the roles swap.
    pub fn resolve<S: DetectSource>(source: &S, path: &str) -> Result<Self> {
        let available = source.variables(path)?;

        if !available.iter().any(|v| v == TIME_FIELD) {
            return Err(AppError::MissingVariable {
                group: path.to_string(),
                candidates: TIME_FIELD.to_string(),
            });
        }

        let value = available
            .iter()
            .take(2)
            .find(|v| v.as_str() != TIME_FIELD)
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidData(format!(
                    "Group '{}' declares no measurement variable next to '{}'",
                    path, TIME_FIELD
                ))
            })?;

        Ok(Self {
            time: TIME_FIELD.to_string(),
            value,
        })
    }
}

/// Pick the dataset-family group present in the file, in priority order
pub fn resolve_series_group<S: DetectSource>(source: &S) -> Result<Option<&'static str>> {
    for name in SERIES_GROUPS {
        if source.has_group(name)? {
            return Ok(Some(*name));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Column, MemorySource};

    #[test]
    fn test_primary_info_fields() {
        let source = MemorySource::new("t")
            .with_variable("Info", "node_id", Column::Int(vec![1]))
            .with_variable("Info", "river_name", Column::Text(vec!["Rhine".into()]))
            .with_variable("Info", "x", Column::Float(vec![7.5]))
            .with_variable("Info", "y", Column::Float(vec![50.0]));

        let fields = InfoFields::resolve(&source, INFO_GROUP).unwrap();
        assert_eq!(
            fields,
            InfoFields {
                id: "node_id".into(),
                name: Some("river_name".into()),
                x: "x".into(),
                y: "y".into(),
            }
        );
    }

    #[test]
    fn test_reach_info_fields() {
        let source = MemorySource::new("t")
            .with_variable("Info", "reach_id", Column::Int(vec![1]))
            .with_variable("Info", "x_reach", Column::Float(vec![7.5]))
            .with_variable("Info", "y_reach", Column::Float(vec![50.0]));

        let fields = InfoFields::resolve(&source, INFO_GROUP).unwrap();
        assert_eq!(fields.id, "reach_id");
        assert_eq!(fields.name, None);
        assert_eq!(fields.x, "x_reach");
        assert_eq!(fields.y, "y_reach");
    }

    #[test]
    fn test_node_id_preferred_over_reach_id() {
        let source = MemorySource::new("t")
            .with_variable("Info", "reach_id", Column::Int(vec![1]))
            .with_variable("Info", "node_id", Column::Int(vec![2]))
            .with_variable("Info", "x", Column::Float(vec![7.5]))
            .with_variable("Info", "y_reach", Column::Float(vec![50.0]));

        let fields = InfoFields::resolve(&source, INFO_GROUP).unwrap();
        assert_eq!(fields.id, "node_id");
        assert_eq!(fields.y, "y_reach");
    }

    #[test]
    fn test_missing_coordinate_names_candidates() {
        let source = MemorySource::new("t")
            .with_variable("Info", "node_id", Column::Int(vec![1]))
            .with_variable("Info", "y", Column::Float(vec![50.0]));

        let err = InfoFields::resolve(&source, INFO_GROUP).unwrap_err();
        assert!(err.to_string().contains("x, x_reach"));
    }

    #[test]
    fn test_series_value_is_second_variable() {
        let source = MemorySource::new("t")
            .with_variable("AltDB/7", "time", Column::Float(vec![58000.0]))
            .with_variable("AltDB/7", "water_level", Column::Float(vec![1.0]))
            .with_variable("AltDB/7", "uncertainty", Column::Float(vec![0.1]));

        let fields = SeriesFields::resolve(&source, "AltDB/7").unwrap();
        assert_eq!(fields.time, "time");
        assert_eq!(fields.value, "water_level");
    }

    #[test]
    fn test_series_time_declared_second() {
        let source = MemorySource::new("t")
            .with_variable("AltDB/7", "discharge", Column::Float(vec![3.0]))
            .with_variable("AltDB/7", "time", Column::Float(vec![58000.0]));

        let fields = SeriesFields::resolve(&source, "AltDB/7").unwrap();
        assert_eq!(fields.value, "discharge");
    }

    #[test]
    fn test_series_without_measurement() {
        let source =
            MemorySource::new("t").with_variable("AltDB/7", "time", Column::Float(vec![1.0]));
        assert!(SeriesFields::resolve(&source, "AltDB/7").is_err());
    }

    #[test]
    fn test_series_group_priority() {
        let source = MemorySource::new("t")
            .with_group("AltDB")
            .with_group("SWOTDB")
            .with_group("LakeDB");
        assert_eq!(resolve_series_group(&source).unwrap(), Some("LakeDB"));

        let source = MemorySource::new("t").with_group("AltDB").with_group("SWOTDB");
        assert_eq!(resolve_series_group(&source).unwrap(), Some("SWOTDB"));

        let source = MemorySource::new("t").with_group("Info");
        assert_eq!(resolve_series_group(&source).unwrap(), None);
    }
}
