//! # georesolver
//!
//! Resolução de endereços para relatos de campo.
//!
//! Traduz endereços em coordenadas e coordenadas em endereços, e sugere
//! endereços a partir de uma entrada parcial, usando as APIs do Google Maps
//! com um cache local com tempo de vida.
//!
//! ## Módulos
//!
//! - [`resolver`] - [`AddressResolver`](resolver::AddressResolver), o ponto de entrada
//! - [`providers`] - Transporte até o provedor de geocodificação
//! - [`cache`] - Cache com TTL sobre memória ou SQLite
//! - [`network`] - Sonda de conectividade
//! - [`cli`] - Interface de linha de comando
//! - [`types`] - Tipos compartilhados

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod network;
pub mod providers;
pub mod resolver;
pub mod types;

pub use resolver::AddressResolver;
pub use types::config::Config;
pub use types::errors::{LookupError, LookupErrorKind, LookupResult, ResolverError, ResolverResult};
pub use types::geo::GeoPoint;
