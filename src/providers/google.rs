//! Transporte para as APIs Geocoding e Places Autocomplete do Google Maps.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::base::GeocodingTransport;
use crate::types::config::ProviderConfig;
use crate::types::errors::{LookupError, LookupResult};
use crate::types::geo::GeoPoint;
use crate::types::responses::{AutocompleteResponse, GeocodeResponse};
use crate::ResolverResult;

const GEOCODE_PATH: &str = "geocode/json";
const AUTOCOMPLETE_PATH: &str = "place/autocomplete/json";

/// Transporte HTTP para o Google Maps.
///
/// Recebe o cliente HTTP pronto; o timeout configurado também é aplicado
/// por requisição.
pub struct GoogleMapsTransport {
    base_url: String,
    api_key: String,
    region: String,
    language: String,
    suggestion_types: String,
    timeout: Duration,
    http_client: Client,
}

impl GoogleMapsTransport {
    /// Cria um transporte com os padrões de [`ProviderConfig`].
    pub fn new(api_key: impl Into<String>, http_client: Client) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            base_url: defaults.base_url.clone(),
            api_key: api_key.into(),
            region: defaults.region.clone(),
            language: defaults.language.clone(),
            suggestion_types: defaults.suggestion_types.clone(),
            timeout: defaults.timeout(),
            http_client,
        }
    }

    /// Cria transporte a partir da configuração do TOML.
    pub fn from_config(config: &ProviderConfig) -> ResolverResult<Self> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
            suggestion_types: config.suggestion_types.clone(),
            timeout: config.timeout(),
            http_client,
        })
    }

    /// Define a URL base (ex.: servidor de testes).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Define o timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> LookupResult<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::network(format!(
                "{} respondeu HTTP {}",
                self.name(),
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| LookupError::MalformedResponse(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout(self.timeout)
        } else {
            // A URL carrega a chave da API
            LookupError::network(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl GeocodingTransport for GoogleMapsTransport {
    fn name(&self) -> &str {
        "Google Maps"
    }

    async fn geocode(&self, address: &str) -> LookupResult<GeocodeResponse> {
        self.get_json(
            GEOCODE_PATH,
            &[
                ("address", address),
                ("key", self.api_key.as_str()),
                ("region", self.region.as_str()),
                ("language", self.language.as_str()),
            ],
        )
        .await
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> LookupResult<GeocodeResponse> {
        let latlng = format!("{},{}", point.latitude, point.longitude);
        self.get_json(
            GEOCODE_PATH,
            &[
                ("latlng", latlng.as_str()),
                ("key", self.api_key.as_str()),
                ("region", self.region.as_str()),
                ("language", self.language.as_str()),
            ],
        )
        .await
    }

    async fn autocomplete(&self, input: &str) -> LookupResult<AutocompleteResponse> {
        self.get_json(
            AUTOCOMPLETE_PATH,
            &[
                ("input", input),
                ("key", self.api_key.as_str()),
                ("region", self.region.as_str()),
                ("types", self.suggestion_types.as_str()),
                ("language", self.language.as_str()),
            ],
        )
        .await
    }
}
