pub mod config;
pub mod db;
pub mod error;
pub mod mjd;
pub mod pipeline;
pub mod schema;
pub mod source;
