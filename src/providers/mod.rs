//! Provedores de geocodificação.
//!
//! Este módulo contém o contrato de transporte usado pelo resolvedor e a
//! implementação HTTP para as APIs do Google Maps.

mod base;
mod google;

pub use base::GeocodingTransport;
pub use google::GoogleMapsTransport;
