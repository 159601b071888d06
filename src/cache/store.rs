//! Armazenamento chave-valor usado pelo cache.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;

use crate::{ResolverError, ResolverResult};

/// Armazenamento persistente (ou não) de pares chave-valor.
///
/// As operações são síncronas e curtas; implementações devem ser seguras
/// para uso concorrente.
pub trait KeyValueStore: Send + Sync {
    /// Nome do backend (para logs e diagnóstico).
    fn name(&self) -> &str;

    /// Lê um valor.
    fn get(&self, key: &str) -> ResolverResult<Option<String>>;

    /// Grava (ou sobrescreve) um valor.
    fn set(&self, key: &str, value: &str) -> ResolverResult<()>;

    /// Remove um valor. Retorna `true` se existia.
    fn remove(&self, key: &str) -> ResolverResult<bool>;

    /// Todos os pares cuja chave começa com `prefix`.
    fn scan_prefix(&self, prefix: &str) -> ResolverResult<Vec<(String, String)>>;

    /// Remove todos os pares cuja chave começa com `prefix`.
    fn remove_prefix(&self, prefix: &str) -> ResolverResult<usize>;

    /// Número total de entradas.
    fn len(&self) -> ResolverResult<usize>;

    /// Verifica se está vazio.
    fn is_empty(&self) -> ResolverResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Store em memória com limite de entradas e despejo LRU.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryStore {
    /// Cria um store com capacidade máxima de `capacity` entradas.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Capacidade máxima.
    pub fn capacity(&self) -> usize {
        self.lock().map(|c| c.cap().get()).unwrap_or(0)
    }

    fn lock(&self) -> ResolverResult<MutexGuard<'_, LruCache<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ResolverError::store("memory store lock poisoned"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> ResolverResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ResolverResult<()> {
        self.lock()?.put(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ResolverResult<bool> {
        Ok(self.lock()?.pop(key).is_some())
    }

    fn scan_prefix(&self, prefix: &str) -> ResolverResult<Vec<(String, String)>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn remove_prefix(&self, prefix: &str) -> ResolverResult<usize> {
        let mut entries = self.lock()?;
        let keys: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &keys {
            entries.pop(key);
        }
        Ok(keys.len())
    }

    fn len(&self) -> ResolverResult<usize> {
        Ok(self.lock()?.len())
    }
}
