//! Cache tipado com tempo de vida sobre um [`KeyValueStore`].

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::entry::{now_millis, CacheEntry, EntryStamp};
use super::store::KeyValueStore;

/// Estatísticas de um namespace do cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Namespace.
    pub namespace: String,

    /// Entradas armazenadas (frescas ou não).
    pub entries: usize,

    /// Número de acertos (cache hits).
    pub hits: u64,

    /// Número de erros (cache misses).
    pub misses: u64,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache de valores `T` com TTL, gravados como JSON em `"<namespace>:<chave>"`.
///
/// Falhas do store nunca se propagam: são registradas em log e tratadas
/// como miss. Entradas vencidas ficam no store até serem sobrescritas ou
/// removidas por [`TtlCache::sweep_expired`].
pub struct TtlCache<T> {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TtlCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Cria um cache.
    ///
    /// # Argumentos
    /// - `store`: Armazenamento compartilhado
    /// - `namespace`: Prefixo das chaves deste cache
    /// - `ttl`: Tempo de vida das entradas
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    /// Namespace deste cache.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Tempo de vida das entradas.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Busca no cache.
    ///
    /// Retorna `None` se não encontrado, ilegível ou vencido.
    pub fn get(&self, key: &str) -> Option<T> {
        let store_key = self.store_key(key);

        let raw = match self.store.get(&store_key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %store_key, "Cache read failed: {}", e);
                None
            }
        };

        let fresh = raw.and_then(|raw| match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if entry.is_fresh(self.ttl, now_millis()) => Some(entry.result),
            Ok(_) => {
                tracing::debug!(key = %store_key, "Cache entry is stale");
                None
            }
            Err(e) => {
                tracing::warn!(key = %store_key, "Discarding unreadable cache entry: {}", e);
                None
            }
        });

        if fresh.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    /// Insere no cache, sobrescrevendo o valor anterior.
    pub fn put(&self, key: &str, value: &T) {
        let store_key = self.store_key(key);
        let entry = CacheEntry::new(value);

        let result = serde_json::to_string(&entry)
            .map_err(crate::ResolverError::from)
            .and_then(|json| self.store.set(&store_key, &json));

        if let Err(e) = result {
            tracing::warn!(key = %store_key, "Cache write failed: {}", e);
        }
    }

    /// Invalida uma entrada específica.
    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.remove(&self.store_key(key)) {
            tracing::warn!("Cache invalidation failed: {}", e);
        }
    }

    /// Remove entradas vencidas ou ilegíveis. Retorna quantas foram removidas.
    pub fn sweep_expired(&self) -> usize {
        let entries = match self.store.scan_prefix(&self.prefix()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, "Cache sweep failed: {}", e);
                return 0;
            }
        };

        let now = now_millis();
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);

        let mut removed = 0;
        for (key, raw) in entries {
            let expired = match serde_json::from_str::<EntryStamp>(&raw) {
                Ok(stamp) => now.saturating_sub(stamp.timestamp) >= ttl_ms,
                Err(_) => true,
            };
            if expired && self.store.remove(&key).unwrap_or(false) {
                removed += 1;
            }
        }
        removed
    }

    /// Limpa todo o namespace.
    pub fn clear(&self) -> usize {
        self.store.remove_prefix(&self.prefix()).unwrap_or_else(|e| {
            tracing::warn!(namespace = %self.namespace, "Cache clear failed: {}", e);
            0
        })
    }

    /// Retorna estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            namespace: self.namespace.clone(),
            entries: self
                .store
                .scan_prefix(&self.prefix())
                .map(|entries| entries.len())
                .unwrap_or(0),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
