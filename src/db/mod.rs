pub mod models;
pub mod session;

pub use models::{NewLocation, NewMeasurement, Tables};
pub use session::Session;

use crate::error::Result;

/// Destination for extracted records.
///
/// Writes are provisional until `commit`; dropping a sink without
/// committing discards them.
#[allow(async_fn_in_trait)]
pub trait Sink {
    /// Insert a location unless its id is already present.
    /// Returns `false` when the id already existed.
    async fn insert_location(&mut self, location: &NewLocation) -> Result<bool>;

    /// Append a measurement row. Repeated rows are kept.
    async fn insert_measurement(&mut self, measurement: &NewMeasurement) -> Result<()>;

    async fn commit(self) -> Result<()>
    where
        Self: Sized;
}
