//! Resolução de endereços.
//!
//! [`AddressResolver`] combina transporte, cache e sonda de conectividade
//! nas três consultas usadas pelo app: geocodificação direta, reversa e
//! sugestões de endereço.

mod address;
mod inflight;

pub use address::{AddressResolver, ResolverCacheStats};
pub(crate) use address::open_store;
pub use inflight::InFlight;
