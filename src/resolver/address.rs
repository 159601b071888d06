//! Resolvedor de endereços com cache, retentativas e cancelamento.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::inflight::InFlight;
use crate::cache::{CacheStats, KeyValueStore, MemoryStore, TtlCache};
use crate::network::{ConnectivityProbe, StaticConnectivity, TcpConnectivity};
use crate::providers::{GeocodingTransport, GoogleMapsTransport};
use crate::types::config::{CacheBackend, Config, ResolverConfig};
use crate::types::errors::{LookupError, LookupResult};
use crate::types::geo::{normalize_query, GeoPoint, COORDINATE_PRECISION};
use crate::ResolverResult;

const GEOCODE_NAMESPACE: &str = "geocode";
const REVERSE_NAMESPACE: &str = "reverse";
const SUGGEST_NAMESPACE: &str = "suggest";

/// Estatísticas dos três caches do resolvedor.
#[derive(Debug, Clone)]
pub struct ResolverCacheStats {
    /// Backend do store.
    pub backend: String,
    pub geocode: CacheStats,
    pub reverse: CacheStats,
    pub suggestions: CacheStats,
    /// Total de entradas no store.
    pub total_entries: usize,
}

/// Resolve endereços em coordenadas e vice-versa, com sugestões.
///
/// - Geocodificação direta e reversa usam o TTL de geocodificação (24h por
///   padrão); sugestões usam um TTL menor (1h).
/// - Só a geocodificação reversa repete a chamada, e só em falhas de
///   transporte, com intervalo fixo.
/// - Chamadas concorrentes para a mesma chave compartilham uma única
///   requisição.
pub struct AddressResolver {
    transport: Arc<dyn GeocodingTransport>,
    probe: Arc<dyn ConnectivityProbe>,
    store: Arc<dyn KeyValueStore>,
    settings: ResolverConfig,
    request_timeout: Duration,
    geocode_cache: TtlCache<GeoPoint>,
    reverse_cache: TtlCache<String>,
    suggestion_cache: TtlCache<Vec<String>>,
    geocode_inflight: InFlight<GeoPoint>,
    reverse_inflight: InFlight<String>,
    suggestion_inflight: InFlight<Vec<String>>,
}

impl AddressResolver {
    /// Cria um resolvedor.
    ///
    /// # Argumentos
    /// - `transport`: Provedor de geocodificação
    /// - `probe`: Sonda de conectividade
    /// - `store`: Armazenamento do cache
    /// - `config`: Configuração completa (usa `resolver`, `cache` e `provider.timeout_secs`)
    pub fn new(
        transport: Arc<dyn GeocodingTransport>,
        probe: Arc<dyn ConnectivityProbe>,
        store: Arc<dyn KeyValueStore>,
        config: &Config,
    ) -> Self {
        let geocode_ttl = config.cache.geocode_ttl();
        Self {
            geocode_cache: TtlCache::new(store.clone(), GEOCODE_NAMESPACE, geocode_ttl),
            reverse_cache: TtlCache::new(store.clone(), REVERSE_NAMESPACE, geocode_ttl),
            suggestion_cache: TtlCache::new(
                store.clone(),
                SUGGEST_NAMESPACE,
                config.cache.suggestion_ttl(),
            ),
            transport,
            probe,
            store,
            settings: config.resolver.clone(),
            request_timeout: config.provider.timeout(),
            geocode_inflight: InFlight::new(),
            reverse_inflight: InFlight::new(),
            suggestion_inflight: InFlight::new(),
        }
    }

    /// Monta o resolvedor completo a partir da configuração do TOML.
    pub fn from_config(config: &Config) -> ResolverResult<Self> {
        let transport: Arc<dyn GeocodingTransport> =
            Arc::new(GoogleMapsTransport::from_config(&config.provider)?);

        let probe: Arc<dyn ConnectivityProbe> = if config.network.probe_enabled {
            Arc::new(TcpConnectivity::from_config(&config.network))
        } else {
            Arc::new(StaticConnectivity::online())
        };

        Ok(Self::new(transport, probe, open_store(config)?, config))
    }

    /// Configuração de consulta em uso.
    pub fn settings(&self) -> &ResolverConfig {
        &self.settings
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Geocodificação direta
    // ═══════════════════════════════════════════════════════════════════════

    /// Resolve um endereço em coordenadas.
    pub async fn geocode_address(&self, address: &str) -> LookupResult<GeoPoint> {
        self.geocode_address_cancellable(address, &CancellationToken::new())
            .await
    }

    /// Como [`geocode_address`](Self::geocode_address), abortando quando `cancel` dispara.
    pub async fn geocode_address_cancellable(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> LookupResult<GeoPoint> {
        let key = normalize_query(address);
        if key.is_empty() {
            return Err(LookupError::InvalidAddress);
        }

        if let Some(point) = self.geocode_cache.get(&key) {
            tracing::debug!(key = %key, "Geocode cache hit");
            return Ok(point);
        }

        let lookup = self
            .geocode_inflight
            .run(&key, || self.fetch_geocode(&key, address.trim()));

        cancellable(cancel, lookup).await
    }

    async fn fetch_geocode(&self, key: &str, address: &str) -> LookupResult<GeoPoint> {
        let response = self.bounded(self.transport.geocode(address)).await?;
        let point = response.into_first()?.point();
        self.geocode_cache.put(key, &point);
        tracing::debug!(key = %key, %point, "Address geocoded");
        Ok(point)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Geocodificação reversa
    // ═══════════════════════════════════════════════════════════════════════

    /// Resolve coordenadas em endereço, com o número padrão de retentativas.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> LookupResult<String> {
        self.reverse_geocode_with_retries(latitude, longitude, self.settings.reverse_retries)
            .await
    }

    /// Resolve coordenadas em endereço com `retries` retentativas.
    pub async fn reverse_geocode_with_retries(
        &self,
        latitude: f64,
        longitude: f64,
        retries: u32,
    ) -> LookupResult<String> {
        self.reverse_geocode_cancellable(latitude, longitude, retries, &CancellationToken::new())
            .await
    }

    /// Geocodificação reversa completa.
    ///
    /// Coordenadas inválidas, inclusive as que arredondam para `(0, 0)`,
    /// falham sem rede. Sem conectividade falha com
    /// [`LookupError::Offline`] sem gastar tentativas. Falhas lógicas do
    /// provedor não são repetidas; falhas de transporte são repetidas até
    /// `retries` vezes com o intervalo fixo configurado.
    pub async fn reverse_geocode_cancellable(
        &self,
        latitude: f64,
        longitude: f64,
        retries: u32,
        cancel: &CancellationToken,
    ) -> LookupResult<String> {
        let point = GeoPoint::new(latitude, longitude)?.rounded(COORDINATE_PRECISION);
        if point.is_unset() {
            return Err(LookupError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        let key = point.cache_key();

        if let Some(address) = self.reverse_cache.get(&key) {
            tracing::debug!(key = %key, "Reverse geocode cache hit");
            return Ok(address);
        }

        if !self.probe.is_connected().await {
            tracing::debug!(key = %key, "Offline, skipping reverse geocode");
            return Err(LookupError::Offline);
        }

        // Só compartilha a busca com quem tem o mesmo orçamento de tentativas
        let inflight_key = format!("{}#{}", key, retries);
        let lookup = self
            .reverse_inflight
            .run(&inflight_key, || self.fetch_reverse(&key, point, retries));

        cancellable(cancel, lookup).await
    }

    async fn fetch_reverse(
        &self,
        key: &str,
        point: GeoPoint,
        retries: u32,
    ) -> LookupResult<String> {
        let address = self.reverse_with_retries(point, retries).await?;
        self.reverse_cache.put(key, &address);
        Ok(address)
    }

    async fn reverse_with_retries(&self, point: GeoPoint, retries: u32) -> LookupResult<String> {
        let delay = self.settings.retry_delay();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.bounded(self.transport.reverse_geocode(point)).await {
                Ok(response) => return Ok(response.into_first()?.formatted_address),
                Err(e) if e.is_retryable() && attempt <= retries => {
                    tracing::warn!(
                        %point,
                        attempt,
                        retries,
                        "Reverse geocode failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(LookupError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sugestões
    // ═══════════════════════════════════════════════════════════════════════

    /// Sugestões de endereço para uma entrada parcial.
    ///
    /// Melhor esforço: qualquer falha resulta em lista vazia.
    pub async fn place_suggestions(&self, input: &str) -> Vec<String> {
        self.place_suggestions_cancellable(input, &CancellationToken::new())
            .await
    }

    /// Como [`place_suggestions`](Self::place_suggestions), abortando quando `cancel` dispara.
    pub async fn place_suggestions_cancellable(
        &self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        let key = normalize_query(input);
        if key.chars().count() < self.settings.min_suggestion_chars {
            return Vec::new();
        }

        if let Some(suggestions) = self.suggestion_cache.get(&key) {
            tracing::debug!(key = %key, "Suggestion cache hit");
            return suggestions;
        }

        if !self.probe.is_connected().await {
            tracing::debug!(key = %key, "Offline, skipping suggestions");
            return Vec::new();
        }

        let lookup = self
            .suggestion_inflight
            .run(&key, || self.fetch_suggestions(&key, input.trim()));

        match cancellable(cancel, lookup).await {
            Ok(suggestions) => suggestions,
            Err(LookupError::NotFound) => Vec::new(),
            Err(e) => {
                tracing::warn!(key = %key, "Place suggestions unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_suggestions(&self, key: &str, input: &str) -> LookupResult<Vec<String>> {
        let response = self.bounded(self.transport.autocomplete(input)).await?;
        let suggestions = response.into_descriptions()?;
        self.suggestion_cache.put(key, &suggestions);
        Ok(suggestions)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Manutenção do cache
    // ═══════════════════════════════════════════════════════════════════════

    /// Retorna estatísticas do cache.
    pub fn cache_stats(&self) -> ResolverCacheStats {
        ResolverCacheStats {
            backend: self.store.name().to_string(),
            geocode: self.geocode_cache.stats(),
            reverse: self.reverse_cache.stats(),
            suggestions: self.suggestion_cache.stats(),
            total_entries: self.store.len().unwrap_or(0),
        }
    }

    /// Remove entradas vencidas de todos os namespaces.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.geocode_cache.sweep_expired()
            + self.reverse_cache.sweep_expired()
            + self.suggestion_cache.sweep_expired();
        tracing::debug!(removed, "Expired cache entries swept");
        removed
    }

    /// Limpa todo o cache do resolvedor.
    pub fn clear_cache(&self) -> usize {
        self.geocode_cache.clear() + self.reverse_cache.clear() + self.suggestion_cache.clear()
    }

    async fn bounded<T, F>(&self, call: F) -> LookupResult<T>
    where
        F: Future<Output = LookupResult<T>>,
    {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .unwrap_or(Err(LookupError::Timeout(self.request_timeout)))
    }
}

/// Abre o store configurado.
pub(crate) fn open_store(config: &Config) -> ResolverResult<Arc<dyn KeyValueStore>> {
    match config.cache.backend {
        #[cfg(feature = "sqlite")]
        CacheBackend::Sqlite => Ok(Arc::new(crate::cache::SqliteStore::open(
            &config.cache.db_path,
            config.cache.max_entries,
        )?)),
        #[cfg(not(feature = "sqlite"))]
        CacheBackend::Sqlite => {
            tracing::warn!("Built without sqlite support, using in-memory cache");
            Ok(Arc::new(MemoryStore::new(config.cache.max_entries)))
        }
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new(config.cache.max_entries))),
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    lookup: impl Future<Output = LookupResult<T>>,
) -> LookupResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LookupError::Cancelled),
        result = lookup => result,
    }
}
