use crate::db::models::{NewLocation, NewMeasurement, Tables};
use crate::db::Sink;
use crate::error::Result;
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::debug;

/// Single-writer database session for one ingestion run.
///
/// All inserts share one transaction that is committed once at the end.
/// Each row runs inside its own savepoint, so a rejected row is rolled
/// back on its own and the rest of the transaction stays usable.
pub struct Session<'c> {
    tx: Transaction<'c, Postgres>,
    tables: Tables,
    insert_location_sql: String,
    insert_measurement_sql: String,
}

impl Session<'static> {
    pub async fn begin(pool: &PgPool, tables: Tables) -> Result<Self> {
        let tx = pool.begin().await?;
        debug!(
            "Opened session for tables {} and {} (SRID {})",
            tables.coordinate, tables.value, tables.srid
        );
        Ok(Self::new(tx, tables))
    }
}

impl<'c> Session<'c> {
    pub fn new(tx: Transaction<'c, Postgres>, tables: Tables) -> Self {
        let insert_location_sql = location_insert_sql(&tables.coordinate);
        let insert_measurement_sql = measurement_insert_sql(&tables.value);

        Self {
            tx,
            tables,
            insert_location_sql,
            insert_measurement_sql,
        }
    }
}

/// Insert-if-absent; lat/lon are stored both as columns and as a point
fn location_insert_sql(table: &str) -> String {
    format!(
        r#"
        INSERT INTO {} (id, name, lat, lon, geonetwork_data_catalog, geom)
        VALUES ($1, $2, $3, $4, $5, ST_SetSRID(ST_MakePoint($4, $3), $6))
        ON CONFLICT (id) DO NOTHING
        "#,
        table
    )
}

/// Append-only: the value table has no conflict handling
fn measurement_insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (id, time, value) VALUES ($1, $2, $3)",
        table
    )
}

impl Sink for Session<'_> {
    async fn insert_location(&mut self, location: &NewLocation) -> Result<bool> {
        let mut savepoint = (&mut self.tx).begin().await?;

        let result = sqlx::query(&self.insert_location_sql)
            .bind(location.id)
            .bind(&location.name)
            .bind(location.y)
            .bind(location.x)
            .bind(&location.catalog_reference)
            .bind(self.tables.srid)
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(done) => {
                savepoint.commit().await?;
                Ok(done.rows_affected() == 1)
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn insert_measurement(&mut self, measurement: &NewMeasurement) -> Result<()> {
        let mut savepoint = (&mut self.tx).begin().await?;

        let result = sqlx::query(&self.insert_measurement_sql)
            .bind(measurement.id)
            .bind(measurement.time)
            .bind(measurement.value)
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(_) => {
                savepoint.commit().await?;
                Ok(())
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_insert_ignores_conflicts() {
        let sql = location_insert_sql("hydro.rhine_coordinates");
        assert!(sql.contains("INSERT INTO hydro.rhine_coordinates"));
        assert!(sql.contains("ON CONFLICT (id) DO NOTHING"));
        assert!(sql.contains("ST_MakePoint($4, $3)"));
    }

    #[test]
    fn test_measurement_insert_is_plain() {
        let sql = measurement_insert_sql("rhine_values");
        assert_eq!(
            sql,
            "INSERT INTO rhine_values (id, time, value) VALUES ($1, $2, $3)"
        );
        assert!(!sql.contains("ON CONFLICT"));
    }
}
