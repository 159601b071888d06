//! Testes de integração do AddressResolver com um transporte roteirizado.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use georesolver::cache::{KeyValueStore, MemoryStore, SqliteStore};
use georesolver::network::StaticConnectivity;
use georesolver::providers::GeocodingTransport;
use georesolver::types::responses::{AutocompleteResponse, GeocodeResponse, GeocodeResult};
use georesolver::{AddressResolver, Config, GeoPoint, LookupError, LookupErrorKind, LookupResult};

/// Transporte que devolve respostas roteirizadas e conta as chamadas.
///
/// Sem roteiro, cada operação responde com sucesso.
#[derive(Default)]
struct ScriptedTransport {
    geocode_calls: AtomicUsize,
    reverse_calls: AtomicUsize,
    autocomplete_calls: AtomicUsize,
    geocode_script: Mutex<VecDeque<LookupResult<GeocodeResponse>>>,
    reverse_script: Mutex<VecDeque<LookupResult<GeocodeResponse>>>,
    autocomplete_script: Mutex<VecDeque<LookupResult<AutocompleteResponse>>>,
    delay: Duration,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn script_geocode(&self, response: LookupResult<GeocodeResponse>) {
        self.geocode_script.lock().unwrap().push_back(response);
    }

    fn script_reverse(&self, response: LookupResult<GeocodeResponse>) {
        self.reverse_script.lock().unwrap().push_back(response);
    }

    fn script_autocomplete(&self, response: LookupResult<AutocompleteResponse>) {
        self.autocomplete_script.lock().unwrap().push_back(response);
    }

    fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    fn autocomplete_calls(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl GeocodingTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn geocode(&self, address: &str) -> LookupResult<GeocodeResponse> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let scripted = self.geocode_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(GeocodeResponse::ok(vec![GeocodeResult::new(
                address,
                -23.561414,
                -46.655881,
            )]))
        })
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> LookupResult<GeocodeResponse> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let scripted = self.reverse_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(GeocodeResponse::ok(vec![GeocodeResult::new(
                "Av. Paulista, 1578 - Bela Vista, São Paulo - SP",
                point.latitude,
                point.longitude,
            )]))
        })
    }

    async fn autocomplete(&self, _input: &str) -> LookupResult<AutocompleteResponse> {
        self.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let scripted = self.autocomplete_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(AutocompleteResponse::ok([
                "Rua Augusta - Consolação, São Paulo - SP",
                "Rua Augusta - Jardins, São Paulo - SP",
            ]))
        })
    }
}

fn test_config() -> Config {
    let mut config = Config::default_config();
    config.network.probe_enabled = false;
    config
}

fn build(
    transport: &Arc<ScriptedTransport>,
    probe: StaticConnectivity,
    config: &Config,
) -> AddressResolver {
    AddressResolver::new(
        transport.clone(),
        Arc::new(probe),
        Arc::new(MemoryStore::new(100)),
        config,
    )
}

fn online(transport: &Arc<ScriptedTransport>) -> AddressResolver {
    build(transport, StaticConnectivity::online(), &test_config())
}

// Geocodificação direta
mod geocode_tests {
    use super::*;

    #[tokio::test]
    async fn test_repeated_address_is_served_from_cache() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);

        let first = resolver.geocode_address("Av. Paulista, 1000").await.unwrap();
        let second = resolver.geocode_address("Av. Paulista, 1000").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.geocode_calls(), 1);
        assert_eq!(resolver.cache_stats().geocode.hits, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_goes_back_to_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut config = test_config();
        config.cache.geocode_ttl_secs = 0;
        let resolver = build(&transport, StaticConnectivity::online(), &config);

        resolver.geocode_address("Rua A").await.unwrap();
        resolver.geocode_address("Rua A").await.unwrap();

        assert_eq!(transport.geocode_calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_results_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_geocode(Ok(GeocodeResponse::with_status("ZERO_RESULTS")));
        let resolver = online(&transport);

        let err = resolver.geocode_address("lugar nenhum").await.unwrap_err();
        assert_eq!(err, LookupError::NotFound);
        assert_eq!(err.kind(), LookupErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_geocode(Err(LookupError::network("connection reset")));
        let resolver = online(&transport);

        assert!(resolver.geocode_address("Rua B").await.is_err());
        assert!(resolver.geocode_address("Rua B").await.is_ok());
        assert_eq!(transport.geocode_calls(), 2);
    }

    #[tokio::test]
    async fn test_forward_geocode_ignores_connectivity_and_retries() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_geocode(Err(LookupError::network("connection reset")));
        let resolver = build(&transport, StaticConnectivity::offline(), &test_config());

        let err = resolver.geocode_address("Rua C").await.unwrap_err();
        assert_eq!(err.kind(), LookupErrorKind::Network);
        assert_eq!(transport.geocode_calls(), 1);
    }
}

// Geocodificação reversa
mod reverse_tests {
    use super::*;

    #[tokio::test]
    async fn test_coordinates_rounding_to_same_key_share_cache() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);

        let first = resolver.reverse_geocode(-23.5613991, -46.6565712).await.unwrap();
        let second = resolver.reverse_geocode(-23.5613989, -46.6565708).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.reverse_calls(), 1);

        // Valores que arredondam para zero com sinais opostos
        let north = resolver.reverse_geocode(0.000001, 10.0).await.unwrap();
        let south = resolver.reverse_geocode(-0.000001, 10.0).await.unwrap();

        assert_eq!(north, south);
        assert_eq!(transport.reverse_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_fail_without_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);

        let cases = [
            (f64::NAN, 10.0),
            (91.0, 0.0),
            (0.0, 181.0),
            (0.0, 0.0),
            (0.000001, 0.000001),
        ];
        for (lat, lng) in cases {
            let err = resolver.reverse_geocode(lat, lng).await.unwrap_err();
            assert_eq!(err.kind(), LookupErrorKind::InvalidInput);
        }
        assert_eq!(transport.reverse_calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_short_circuits() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = build(&transport, StaticConnectivity::offline(), &test_config());

        let err = resolver.reverse_geocode(-23.5, -46.6).await.unwrap_err();

        assert_eq!(err, LookupError::Offline);
        assert_eq!(transport.reverse_calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_address_is_available_offline() {
        let transport = Arc::new(ScriptedTransport::new());
        let probe = Arc::new(StaticConnectivity::online());
        let resolver = AddressResolver::new(
            transport.clone(),
            probe.clone(),
            Arc::new(MemoryStore::new(100)),
            &test_config(),
        );

        let online_address = resolver.reverse_geocode(-23.5, -46.6).await.unwrap();
        probe.set_online(false);
        let offline_address = resolver.reverse_geocode(-23.5, -46.6).await.unwrap();

        assert_eq!(online_address, offline_address);
        assert_eq!(transport.reverse_calls(), 1);
    }

    #[tokio::test]
    async fn test_logical_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_reverse(Ok(GeocodeResponse::with_status("ZERO_RESULTS")));
        let resolver = online(&transport);

        let err = resolver.reverse_geocode(-23.5, -46.6).await.unwrap_err();

        assert_eq!(err, LookupError::NotFound);
        assert_eq!(transport.reverse_calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_rejection_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_reverse(Ok(GeocodeResponse::with_status("OVER_QUERY_LIMIT")));
        let resolver = online(&transport);

        let err = resolver.reverse_geocode(-23.5, -46.6).await.unwrap_err();

        assert_eq!(err.kind(), LookupErrorKind::Provider);
        assert_eq!(transport.reverse_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_exhaust_retries_with_fixed_delay() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..3 {
            transport.script_reverse(Err(LookupError::network("connection refused")));
        }
        let resolver = online(&transport);

        let started = tokio::time::Instant::now();
        let err = resolver.reverse_geocode(-23.5, -46.6).await.unwrap_err();
        let elapsed = started.elapsed();

        match err {
            LookupError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert_eq!(last.kind(), LookupErrorKind::Network);
            }
            other => panic!("erro inesperado: {:?}", other),
        }
        assert_eq!(transport.reverse_calls(), 3);
        assert!(elapsed >= Duration::from_millis(2000), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2100), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_reverse(Err(LookupError::network("connection reset")));
        let resolver = online(&transport);

        let address = resolver.reverse_geocode(-23.5, -46.6).await.unwrap();

        assert!(address.starts_with("Av. Paulista"));
        assert_eq!(transport.reverse_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_and_is_retried() {
        let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_secs(30)));
        let resolver = online(&transport);

        let err = resolver
            .reverse_geocode_with_retries(-23.5, -46.6, 1)
            .await
            .unwrap_err();

        match err {
            LookupError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(*last, LookupError::Timeout(Duration::from_secs(8)));
            }
            other => panic!("erro inesperado: {:?}", other),
        }
        assert_eq!(transport.reverse_calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_reverse(Err(LookupError::network("connection refused")));
        let resolver = online(&transport);

        let err = resolver
            .reverse_geocode_with_retries(-23.5, -46.6, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(transport.reverse_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_keep_their_own_retry_budget() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..4 {
            transport.script_reverse(Err(LookupError::network("connection refused")));
        }
        let resolver = online(&transport);

        let (single, patient) = tokio::join!(
            resolver.reverse_geocode_with_retries(-23.5, -46.6, 0),
            resolver.reverse_geocode_with_retries(-23.5, -46.6, 2),
        );

        assert!(matches!(
            single.unwrap_err(),
            LookupError::RetriesExhausted { attempts: 1, .. }
        ));
        assert!(matches!(
            patient.unwrap_err(),
            LookupError::RetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(transport.reverse_calls(), 4);
    }
}

// Sugestões
mod suggestion_tests {
    use super::*;

    #[tokio::test]
    async fn test_short_input_returns_empty_without_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);

        assert!(resolver.place_suggestions("ab").await.is_empty());
        assert!(resolver.place_suggestions("  ab  ").await.is_empty());
        assert_eq!(transport.autocomplete_calls(), 0);
    }

    #[tokio::test]
    async fn test_suggestions_are_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);

        let first = resolver.place_suggestions("Rua Aug").await;
        let second = resolver.place_suggestions("rua aug").await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(transport.autocomplete_calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_returns_empty_without_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = build(&transport, StaticConnectivity::offline(), &test_config());

        assert!(resolver.place_suggestions("Rua Aug").await.is_empty());
        assert_eq!(transport.autocomplete_calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_results_is_empty_and_not_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_autocomplete(Ok(AutocompleteResponse::with_status("ZERO_RESULTS")));
        let resolver = online(&transport);

        assert!(resolver.place_suggestions("Rua Xyz").await.is_empty());
        assert_eq!(resolver.place_suggestions("Rua Xyz").await.len(), 2);
        assert_eq!(transport.autocomplete_calls(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_autocomplete(Err(LookupError::network("connection reset")));
        let resolver = online(&transport);

        assert!(resolver.place_suggestions("Rua Aug").await.is_empty());
        assert_eq!(transport.autocomplete_calls(), 1);
    }
}

// Coalescência e cancelamento
mod concurrency_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_lookups_share_one_request() {
        let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_millis(200)));
        let resolver = online(&transport);

        let (a, b, c) = tokio::join!(
            resolver.reverse_geocode(-23.5, -46.6),
            resolver.reverse_geocode(-23.5, -46.6),
            resolver.reverse_geocode(-23.500001, -46.600001),
        );

        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(transport.reverse_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_geocodes_share_one_request() {
        let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_millis(200)));
        let resolver = online(&transport);

        let (a, b) = tokio::join!(
            resolver.geocode_address("Rua Augusta"),
            resolver.geocode_address("rua  augusta"),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.geocode_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_lookup() {
        let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_secs(5)));
        let resolver = online(&transport);
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            })
        };

        let err = resolver
            .geocode_address_cancellable("Rua Augusta", &token)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert_eq!(err, LookupError::Cancelled);
        assert_eq!(err.kind(), LookupErrorKind::Cancelled);
        assert_eq!(resolver.cache_stats().geocode.entries, 0);
    }

    #[tokio::test]
    async fn test_cancelled_suggestions_are_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);
        let token = CancellationToken::new();
        token.cancel();

        assert!(resolver
            .place_suggestions_cancellable("Rua Aug", &token)
            .await
            .is_empty());
    }

    fn cancel_after(token: &CancellationToken, delay: Duration) -> tokio::task::JoinHandle<()> {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel();
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_does_not_affect_shared_lookup() {
        let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_millis(200)));
        let resolver = online(&transport);
        let patient = CancellationToken::new();
        let hasty = CancellationToken::new();
        let canceller = cancel_after(&hasty, Duration::from_millis(50));

        // O primeiro futuro executado dispara a busca; o segundo só aguarda
        let (kept, dropped) = tokio::join!(
            resolver.reverse_geocode_cancellable(-23.5, -46.6, 2, &patient),
            resolver.reverse_geocode_cancellable(-23.5, -46.6, 2, &hasty),
        );
        canceller.await.unwrap();

        assert!(kept.unwrap().starts_with("Av. Paulista"));
        assert_eq!(dropped.unwrap_err(), LookupError::Cancelled);
        assert_eq!(transport.reverse_calls(), 1);

        resolver.reverse_geocode(-23.5, -46.6).await.unwrap();
        assert_eq!(transport.reverse_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_runner_hands_lookup_to_waiter() {
        let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_millis(200)));
        let resolver = online(&transport);
        let hasty = CancellationToken::new();
        let patient = CancellationToken::new();
        let canceller = cancel_after(&hasty, Duration::from_millis(50));

        let (dropped, kept) = tokio::join!(
            resolver.reverse_geocode_cancellable(-23.5, -46.6, 2, &hasty),
            resolver.reverse_geocode_cancellable(-23.5, -46.6, 2, &patient),
        );
        canceller.await.unwrap();

        assert_eq!(dropped.unwrap_err(), LookupError::Cancelled);
        assert!(kept.unwrap().starts_with("Av. Paulista"));
        assert_eq!(transport.reverse_calls(), 2);

        // O resultado do substituto fica no cache
        resolver.reverse_geocode(-23.5, -46.6).await.unwrap();
        assert_eq!(transport.reverse_calls(), 2);
        assert_eq!(resolver.cache_stats().reverse.entries, 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_reverse_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);
        let token = CancellationToken::new();
        token.cancel();

        let err = resolver
            .reverse_geocode_cancellable(-23.5, -46.6, 2, &token)
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::Cancelled);
    }
}

// Manutenção e persistência do cache
mod cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut config = test_config();
        config.cache.geocode_ttl_secs = 0;
        config.cache.suggestion_ttl_secs = 0;
        let resolver = build(&transport, StaticConnectivity::online(), &config);

        resolver.geocode_address("Rua A").await.unwrap();
        resolver.reverse_geocode(-23.5, -46.6).await.unwrap();
        resolver.place_suggestions("Rua Aug").await;
        assert_eq!(resolver.cache_stats().total_entries, 3);

        assert_eq!(resolver.sweep_expired(), 3);
        assert_eq!(resolver.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_entries() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = online(&transport);

        resolver.geocode_address("Rua A").await.unwrap();

        assert_eq!(resolver.sweep_expired(), 0);
        assert_eq!(resolver.cache_stats().total_entries, 1);
    }

    #[tokio::test]
    async fn test_sqlite_cache_survives_restart() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("cache.db");
        let transport = Arc::new(ScriptedTransport::new());

        {
            let store: Arc<dyn KeyValueStore> =
                Arc::new(SqliteStore::open(&db_path, 100).expect("Failed to open store"));
            let resolver = AddressResolver::new(
                transport.clone(),
                Arc::new(StaticConnectivity::online()),
                store,
                &test_config(),
            );
            resolver.reverse_geocode(-23.5, -46.6).await.unwrap();
        }

        let store: Arc<dyn KeyValueStore> =
            Arc::new(SqliteStore::open(&db_path, 100).expect("Failed to reopen store"));
        let resolver = AddressResolver::new(
            transport.clone(),
            Arc::new(StaticConnectivity::offline()),
            store,
            &test_config(),
        );

        let address = resolver.reverse_geocode(-23.5, -46.6).await.unwrap();
        assert!(address.starts_with("Av. Paulista"));
        assert_eq!(transport.reverse_calls(), 1);
        assert_eq!(resolver.cache_stats().backend, "sqlite");
    }
}
