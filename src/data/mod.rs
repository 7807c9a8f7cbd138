//! Earthquake catalogue boundary
//!
//! Files and query rows are normalised here into [`Earthquake`] values with
//! numeric depth and magnitude; nothing past this module sees raw input.

pub mod earthquake;
pub mod query;

pub use earthquake::{from_geojson_str, from_json_str, from_path, Earthquake, QueryRow};
pub use query::DatasetQuery;
