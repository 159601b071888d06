//! Tipos geográficos e normalização de chaves de cache.

use serde::{Deserialize, Serialize};

use super::errors::{LookupError, LookupResult};

/// Casas decimais usadas para estabilizar chaves de coordenadas.
///
/// Cinco casas equivalem a ~1,1 m no equador.
pub const COORDINATE_PRECISION: u32 = 5;

/// Um ponto geográfico (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Cria um ponto validado.
    ///
    /// Rejeita valores não finitos, fora de `[-90, 90]` / `[-180, 180]` e o
    /// ponto `(0, 0)`, que o app usa como "localização não definida".
    pub fn new(latitude: f64, longitude: f64) -> LookupResult<Self> {
        let point = Self {
            latitude,
            longitude,
        };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(LookupError::InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }

    /// Verifica os invariantes do ponto.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
            && !self.is_unset()
    }

    /// `(0, 0)` significa "sem localização".
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Arredonda ambas as coordenadas para `decimals` casas.
    ///
    /// Valores que arredondam para zero viram `0.0` positivo, para que
    /// `-0.000001` e `0.000001` gerem a mesma chave.
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self {
            latitude: round_to(self.latitude, factor),
            longitude: round_to(self.longitude, factor),
        }
    }

    /// Chave de cache: coordenadas arredondadas com precisão fixa.
    pub fn cache_key(&self) -> String {
        let p = self.rounded(COORDINATE_PRECISION);
        format!("{:.5},{:.5}", p.latitude, p.longitude)
    }
}

fn round_to(value: f64, factor: f64) -> f64 {
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Normaliza texto livre para uso como chave de cache.
///
/// Minúsculas, sem espaços nas pontas e com espaços internos colapsados.
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
