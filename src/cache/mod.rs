//! Cache local das consultas de endereço.
//!
//! O cache é dividido em duas camadas:
//!
//! - [`KeyValueStore`]: armazenamento chave-valor de strings, limitado em
//!   número de entradas ([`MemoryStore`] ou [`SqliteStore`]).
//! - [`TtlCache`]: visão tipada e com namespace sobre um store, onde cada
//!   valor é gravado junto com o instante em que foi obtido.

mod entry;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store;
mod ttl;

pub use entry::{now_millis, CacheEntry};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use store::{KeyValueStore, MemoryStore};
pub use ttl::{CacheStats, TtlCache};
