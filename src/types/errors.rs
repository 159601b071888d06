//! Tipos de erro do georesolver.
//!
//! Há dois níveis de erro:
//!
//! - [`ResolverError`]: falhas de infraestrutura (configuração, IO, banco,
//!   construção do cliente HTTP).
//! - [`LookupError`]: resultado de uma consulta de endereço. Substitui as
//!   antigas strings sentinela ("Endereço não encontrado", ...) por um tipo
//!   que o chamador pode inspecionar via [`LookupError::kind`].

use std::time::Duration;

use thiserror::Error;

/// Tipo de resultado padrão do georesolver.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Resultado de uma consulta ao provedor de geocodificação.
pub type LookupResult<T> = Result<T, LookupError>;

/// Erros de infraestrutura.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Erro no banco de cache: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Erro no cliente HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "cli")]
    #[error("Erro na interação: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Erro no armazenamento: {0}")]
    Store(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ResolverError {
    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de armazenamento.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }
}

/// Categoria de uma falha de consulta.
///
/// É o que a interface deve usar para decidir como reagir (mostrar botão de
/// tentar novamente, pedir outro endereço, ...), em vez de comparar textos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupErrorKind {
    /// Entrada inválida (endereço vazio, coordenadas fora do intervalo).
    InvalidInput,
    /// Sem conectividade.
    Offline,
    /// O provedor respondeu, mas sem resultados.
    NotFound,
    /// O provedor recusou a requisição ou respondeu algo ilegível.
    Provider,
    /// Falha de transporte.
    Network,
    /// Tempo limite excedido.
    Timeout,
    /// O chamador desistiu da consulta.
    Cancelled,
}

impl std::fmt::Display for LookupErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupErrorKind::InvalidInput => write!(f, "invalid_input"),
            LookupErrorKind::Offline => write!(f, "offline"),
            LookupErrorKind::NotFound => write!(f, "not_found"),
            LookupErrorKind::Provider => write!(f, "provider"),
            LookupErrorKind::Network => write!(f, "network"),
            LookupErrorKind::Timeout => write!(f, "timeout"),
            LookupErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Falha de uma consulta de geocodificação.
///
/// As mensagens são localizadas (pt-BR) e podem ser exibidas diretamente.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Endereço inválido: informe um endereço não vazio")]
    InvalidAddress,

    #[error("Coordenadas inválidas: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Sem conexão com a internet")]
    Offline,

    #[error("Endereço não encontrado")]
    NotFound,

    #[error("O provedor recusou a requisição ({status}){}", detail_suffix(.message))]
    ProviderRejected {
        status: String,
        message: Option<String>,
    },

    #[error("Resposta inválida do provedor: {0}")]
    MalformedResponse(String),

    #[error("Falha de rede: {0}")]
    Network(String),

    #[error("Tempo limite de {0:?} excedido")]
    Timeout(Duration),

    #[error("Falha ao obter endereço após várias tentativas ({attempts}): {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<LookupError>,
    },

    #[error("Consulta cancelada")]
    Cancelled,
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl LookupError {
    /// Cria um erro de rede.
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Categoria da falha.
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            LookupError::InvalidAddress | LookupError::InvalidCoordinates { .. } => {
                LookupErrorKind::InvalidInput
            }
            LookupError::Offline => LookupErrorKind::Offline,
            LookupError::NotFound => LookupErrorKind::NotFound,
            LookupError::ProviderRejected { .. } | LookupError::MalformedResponse(_) => {
                LookupErrorKind::Provider
            }
            LookupError::Network(_) => LookupErrorKind::Network,
            LookupError::Timeout(_) => LookupErrorKind::Timeout,
            LookupError::RetriesExhausted { last, .. } => last.kind(),
            LookupError::Cancelled => LookupErrorKind::Cancelled,
        }
    }

    /// Só falhas de transporte valem uma nova tentativa.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LookupError::Network(_) | LookupError::Timeout(_))
    }
}
