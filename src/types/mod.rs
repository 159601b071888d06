//! Tipos compartilhados do georesolver.

pub mod config;
pub mod errors;
pub mod geo;
pub mod responses;

pub use config::Config;
pub use errors::{LookupError, LookupErrorKind, LookupResult, ResolverError, ResolverResult};
pub use geo::GeoPoint;
