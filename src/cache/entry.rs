//! Entrada de cache com carimbo de tempo.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Instante atual em milissegundos desde a época Unix.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Valor em cache e o momento em que foi obtido.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Resultado da consulta.
    pub result: T,

    /// Momento da gravação (epoch ms).
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    /// Cria uma entrada carimbada com o instante atual.
    pub fn new(result: T) -> Self {
        Self::at(result, now_millis())
    }

    /// Cria uma entrada com carimbo explícito.
    pub fn at(result: T, timestamp: i64) -> Self {
        Self { result, timestamp }
    }

    /// Idade da entrada em `now_ms`.
    pub fn age_millis(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// Fresca enquanto a idade for menor que o TTL.
    pub fn is_fresh(&self, ttl: Duration, now_ms: i64) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_millis(now_ms) < ttl_ms
    }
}

/// Só o carimbo de uma entrada; usado pela limpeza sem conhecer `T`.
#[derive(Debug, Deserialize)]
pub(crate) struct EntryStamp {
    pub timestamp: i64,
}
