use chrono::{DateTime, Utc};

/// One monitored location, destined for the coordinate table
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub id: i64,
    pub name: Option<String>,
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// External catalog cross-reference. No current source provides one.
    pub catalog_reference: Option<String>,
}

/// One observation, destined for the value table
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Destination table names and the SRID of the point geometries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub coordinate: String,
    pub value: String,
    pub srid: i32,
}
