//! Tipos de resposta do provedor de geocodificação (formato Google Maps).

use serde::{Deserialize, Serialize};

use super::errors::LookupError;
use super::geo::GeoPoint;

/// Status de sucesso do provedor.
pub const STATUS_OK: &str = "OK";

/// Status para consultas válidas sem resultado.
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Resposta dos endpoints de geocodificação (direta e reversa).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,

    #[serde(default)]
    pub results: Vec<GeocodeResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Um resultado de geocodificação.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,

    #[serde(default)]
    pub formatted_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for GeoPoint {
    fn from(value: LatLng) -> Self {
        GeoPoint {
            latitude: value.lat,
            longitude: value.lng,
        }
    }
}

impl GeocodeResponse {
    /// Cria uma resposta de sucesso (útil em testes e mocks).
    pub fn ok(results: Vec<GeocodeResult>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            results,
            error_message: None,
        }
    }

    /// Cria uma resposta com o status informado e sem resultados.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            results: Vec::new(),
            error_message: None,
        }
    }

    /// Primeiro resultado, ou o erro lógico correspondente ao status.
    pub fn into_first(self) -> Result<GeocodeResult, LookupError> {
        check_status(&self.status, self.error_message)?;
        self.results.into_iter().next().ok_or(LookupError::NotFound)
    }
}

impl GeocodeResult {
    /// Cria um resultado.
    pub fn new(formatted_address: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            geometry: Geometry {
                location: LatLng { lat, lng },
            },
            formatted_address: formatted_address.into(),
        }
    }

    /// Coordenadas do resultado.
    pub fn point(&self) -> GeoPoint {
        self.geometry.location.into()
    }
}

/// Resposta do endpoint de autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    pub status: String,

    #[serde(default)]
    pub predictions: Vec<Prediction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub description: String,
}

impl AutocompleteResponse {
    /// Cria uma resposta de sucesso com as descrições informadas.
    pub fn ok<I, S>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: STATUS_OK.to_string(),
            predictions: descriptions
                .into_iter()
                .map(|d| Prediction {
                    description: d.into(),
                })
                .collect(),
            error_message: None,
        }
    }

    /// Cria uma resposta com o status informado e sem sugestões.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            predictions: Vec::new(),
            error_message: None,
        }
    }

    /// Descrições das sugestões, ou o erro lógico correspondente ao status.
    pub fn into_descriptions(self) -> Result<Vec<String>, LookupError> {
        check_status(&self.status, self.error_message)?;
        Ok(self
            .predictions
            .into_iter()
            .map(|p| p.description)
            .collect())
    }
}

fn check_status(status: &str, message: Option<String>) -> Result<(), LookupError> {
    match status {
        STATUS_OK => Ok(()),
        STATUS_ZERO_RESULTS => Err(LookupError::NotFound),
        other => Err(LookupError::ProviderRejected {
            status: other.to_string(),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geocode_response() {
        let body = r#"{
            "results": [{
                "formatted_address": "Av. Paulista, 1000 - Bela Vista, São Paulo - SP, Brasil",
                "geometry": { "location": { "lat": -23.5646162, "lng": -46.6527547 },
                              "location_type": "ROOFTOP" },
                "place_id": "abc"
            }],
            "status": "OK"
        }"#;

        let response: GeocodeResponse = serde_json::from_str(body).unwrap();
        let first = response.into_first().unwrap();
        assert!(first.formatted_address.starts_with("Av. Paulista"));
        assert_eq!(first.point().latitude, -23.5646162);
    }

    #[test]
    fn test_zero_results_is_not_found() {
        let body = r#"{ "results": [], "status": "ZERO_RESULTS" }"#;
        let response: GeocodeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_first().unwrap_err(), LookupError::NotFound);
    }

    #[test]
    fn test_ok_without_results_is_not_found() {
        let response = GeocodeResponse::ok(vec![]);
        assert_eq!(response.into_first().unwrap_err(), LookupError::NotFound);
    }

    #[test]
    fn test_denied_carries_message() {
        let body = r#"{ "error_message": "The provided API key is invalid.",
                        "results": [], "status": "REQUEST_DENIED" }"#;
        let response: GeocodeResponse = serde_json::from_str(body).unwrap();
        match response.into_first().unwrap_err() {
            LookupError::ProviderRejected { status, message } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message.as_deref(), Some("The provided API key is invalid."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_autocomplete_response() {
        let body = r#"{
            "predictions": [
                { "description": "Rua Augusta, São Paulo - SP, Brasil", "place_id": "1" },
                { "description": "Rua Augusta, Curitiba - PR, Brasil", "place_id": "2" }
            ],
            "status": "OK"
        }"#;
        let response: AutocompleteResponse = serde_json::from_str(body).unwrap();
        let descriptions = response.into_descriptions().unwrap();
        assert_eq!(descriptions.len(), 2);
        assert_eq!(descriptions[1], "Rua Augusta, Curitiba - PR, Brasil");
    }

    #[test]
    fn test_missing_predictions_field_defaults_empty() {
        let body = r#"{ "status": "ZERO_RESULTS" }"#;
        let response: AutocompleteResponse = serde_json::from_str(body).unwrap();
        assert!(response.predictions.is_empty());
    }
}
