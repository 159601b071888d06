//! Trait base para transportes de geocodificação.

use async_trait::async_trait;

use crate::types::errors::LookupResult;
use crate::types::geo::GeoPoint;
use crate::types::responses::{AutocompleteResponse, GeocodeResponse};

/// Transporte até um provedor de geocodificação.
///
/// Implementações apenas executam a chamada e decodificam a resposta:
/// falhas de transporte viram [`LookupError::Network`] ou
/// [`LookupError::Timeout`], e o `status` lógico da resposta é devolvido
/// intacto para o resolvedor interpretar.
///
/// [`LookupError::Network`]: crate::LookupError::Network
/// [`LookupError::Timeout`]: crate::LookupError::Timeout
#[async_trait]
pub trait GeocodingTransport: Send + Sync {
    /// Nome do provedor.
    fn name(&self) -> &str;

    /// Geocodificação direta (endereço → coordenadas).
    async fn geocode(&self, address: &str) -> LookupResult<GeocodeResponse>;

    /// Geocodificação reversa (coordenadas → endereço).
    async fn reverse_geocode(&self, point: GeoPoint) -> LookupResult<GeocodeResponse>;

    /// Sugestões de endereço para uma entrada parcial.
    async fn autocomplete(&self, input: &str) -> LookupResult<AutocompleteResponse>;
}
