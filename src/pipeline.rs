use crate::db::{NewLocation, NewMeasurement, Session, Sink, Tables};
use crate::error::{AppError, IngestError, RecordError, RecordKey};
use crate::mjd::mjd_to_datetime;
use crate::schema::{resolve_series_group, InfoFields, SeriesFields, INFO_GROUP, SERIES_GROUPS};
use crate::source::{child_path, DetectSource, NcSource};
use sqlx::PgPool;
use std::path::Path;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
pub struct CoordinateReport {
    pub attempted: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub failures: Vec<RecordError>,
}

#[derive(Debug, Default)]
pub struct SeriesReport {
    pub group: String,
    pub subgroups: usize,
    pub inserted: usize,
    pub failures: Vec<RecordError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Both loaders ran and the session was committed
    Completed,
    /// A required group was missing; rows written before that were committed
    Aborted { reason: String },
    /// Nothing from this file was committed
    Failed { reason: String },
}

#[derive(Debug)]
pub struct IngestReport {
    pub source: String,
    pub coordinates: Option<CoordinateReport>,
    pub series: Option<SeriesReport>,
    pub outcome: Outcome,
}

impl IngestReport {
    fn new(source: String) -> Self {
        Self {
            source,
            coordinates: None,
            series: None,
            outcome: Outcome::Completed,
        }
    }

    fn failed(source: String, reason: String) -> Self {
        Self {
            outcome: Outcome::Failed { reason },
            ..Self::new(source)
        }
    }

    pub fn committed(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed { .. })
    }

    pub fn measurements_inserted(&self) -> usize {
        self.series.as_ref().map_or(0, |s| s.inserted)
    }

    pub fn locations_inserted(&self) -> usize {
        self.coordinates.as_ref().map_or(0, |c| c.inserted)
    }
}

/// Read every location in the `Info` group and insert the ones not yet
/// present in the coordinate table.
pub async fn load_coordinates<S, K>(
    source: &S,
    sink: &mut K,
) -> Result<CoordinateReport, IngestError>
where
    S: DetectSource,
    K: Sink,
{
    if !source.has_group(INFO_GROUP)? {
        return Err(IngestError::MissingGroup(INFO_GROUP.to_string()));
    }

    let fields = InfoFields::resolve(source, INFO_GROUP)?;
    debug!("Resolved Info fields: {:?}", fields);

    let ids = source.read_i64(INFO_GROUP, &fields.id)?;
    let names = match &fields.name {
        Some(name) => source.read_text(INFO_GROUP, name)?,
        None => vec![None; ids.len()],
    };
    let xs = source.read_f64(INFO_GROUP, &fields.x)?;
    let ys = source.read_f64(INFO_GROUP, &fields.y)?;

    let count = ids.len().min(names.len()).min(xs.len()).min(ys.len());
    if count < ids.len().max(names.len()).max(xs.len()).max(ys.len()) {
        warn!(
            "Info arrays differ in length (ids {}, names {}, x {}, y {}); using the first {}",
            ids.len(),
            names.len(),
            xs.len(),
            ys.len(),
            count
        );
    }

    info!("Inserting {} coordinates...", count);

    let mut report = CoordinateReport::default();
    let rows = ids.into_iter().zip(names).zip(xs).zip(ys).enumerate();
    for (index, (((id, name), x), y)) in rows {
        report.attempted += 1;

        let id = match id {
            Ok(id) => id,
            Err(e) => {
                error!("Error reading coordinate entry #{} ({}): {}", index, fields.id, e);
                report.failures.push(RecordError::at(RecordKey::Entry(index), e));
                continue;
            }
        };

        let location = NewLocation {
            id,
            name,
            x,
            y,
            catalog_reference: None,
        };

        match sink.insert_location(&location).await {
            Ok(true) => report.inserted += 1,
            Ok(false) => report.already_present += 1,
            Err(e) => {
                error!("Error inserting coordinate id {}: {}", id, e);
                report.failures.push(RecordError::new(id, e));
            }
        }
    }

    info!(
        "Coordinates: {} inserted, {} already present, {} failed",
        report.inserted,
        report.already_present,
        report.failures.len()
    );

    Ok(report)
}

/// Insert one row per (location, time, value) found in the dataset-family group.
pub async fn load_series<S, K>(source: &S, sink: &mut K) -> Result<SeriesReport, IngestError>
where
    S: DetectSource,
    K: Sink,
{
    let group = resolve_series_group(source)?
        .ok_or_else(|| IngestError::MissingGroup(SERIES_GROUPS.join(" | ")))?;

    info!("Inserting time series from {}...", group);

    let mut report = SeriesReport {
        group: group.to_string(),
        ..SeriesReport::default()
    };

    for name in source.subgroups(group)? {
        report.subgroups += 1;
        let path = child_path(group, &name);

        let id = match name.trim().parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                let e = AppError::InvalidData(format!("'{}' is not a location id", path));
                error!("Error reading series: {}", e);
                report.failures.push(RecordError::at(RecordKey::Subgroup(name), e));
                continue;
            }
        };

        let fields = match SeriesFields::resolve(source, &path) {
            Ok(fields) => fields,
            Err(e) => {
                error!("Error reading series for id {}: {}", id, e);
                report.failures.push(RecordError::new(id, e));
                continue;
            }
        };

        let times = source.read_f64(&path, &fields.time)?;
        let values = source.read_f64(&path, &fields.value)?;

        if times.len() != values.len() {
            warn!(
                "Series for id {} has {} times but {} '{}' values; pairing the first {}",
                id,
                times.len(),
                values.len(),
                fields.value,
                times.len().min(values.len())
            );
        }

        for (mjd, value) in times.into_iter().zip(values) {
            let time = match mjd_to_datetime(mjd) {
                Ok(time) => time,
                Err(e) => {
                    error!("Error inserting value for id {}: {}", id, e);
                    report.failures.push(RecordError::new(id, e));
                    continue;
                }
            };

            let measurement = NewMeasurement { id, time, value };
            match sink.insert_measurement(&measurement).await {
                Ok(()) => report.inserted += 1,
                Err(e) => {
                    error!("Error inserting value for id {}: {}", id, e);
                    report.failures.push(RecordError::new(id, e));
                }
            }
        }
    }

    Ok(report)
}

async fn extract<S, K>(
    source: &S,
    sink: &mut K,
    report: &mut IngestReport,
) -> Result<(), IngestError>
where
    S: DetectSource,
    K: Sink,
{
    report.coordinates = Some(load_coordinates(source, sink).await?);
    report.series = Some(load_series(source, sink).await?);
    Ok(())
}

/// Load one file through `sink` and commit once at the end.
///
/// A missing group stops extraction but keeps what was written. Any other
/// failure drops the sink uncommitted. Errors never escape; they are
/// logged and reflected in the returned report.
pub async fn ingest<S, K>(source: &S, mut sink: K) -> IngestReport
where
    S: DetectSource,
    K: Sink,
{
    info!("Processing file: {}", source.describe());
    let mut report = IngestReport::new(source.describe());

    match extract(source, &mut sink, &mut report).await {
        Ok(()) => {}
        Err(e) if e.is_structural() => {
            error!("{}", e);
            report.outcome = Outcome::Aborted {
                reason: e.to_string(),
            };
        }
        Err(e) => {
            error!("{}", e);
            report.outcome = Outcome::Failed {
                reason: e.to_string(),
            };
            return report;
        }
    }

    match sink.commit().await {
        Ok(()) => info!(
            "Successfully inserted {} records.",
            report.measurements_inserted()
        ),
        Err(e) => {
            error!("Commit failed: {}", e);
            report.outcome = Outcome::Failed {
                reason: format!("Commit failed: {}", e),
            };
        }
    }

    report
}

/// Open a DETECT file and load it into the configured tables in one session
pub async fn ingest_file(path: &Path, pool: &PgPool, tables: Tables) -> IngestReport {
    let describe = path.display().to_string();

    let source = match NcSource::open(path) {
        Ok(source) => source,
        Err(e) => {
            error!("File processing failed: {}", e);
            return IngestReport::failed(describe, e.to_string());
        }
    };

    let session = match Session::begin(pool, tables).await {
        Ok(session) => session,
        Err(e) => {
            error!("Could not start database session: {}", e);
            return IngestReport::failed(describe, e.to_string());
        }
    };

    ingest(&source, session).await
}
