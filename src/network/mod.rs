//! Verificação de conectividade.
//!
//! O resolvedor consulta a sonda antes de geocodificação reversa e
//! sugestões, para responder imediatamente quando não há rede.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::types::config::NetworkConfig;

/// Sonda de conectividade.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Retorna `true` se há rede disponível.
    async fn is_connected(&self) -> bool;
}

/// Sonda com estado fixo, alterável em tempo de execução.
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Sempre conectado.
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Sempre desconectado.
    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for StaticConnectivity {
    fn default() -> Self {
        Self::online()
    }
}

#[async_trait]
impl ConnectivityProbe for StaticConnectivity {
    async fn is_connected(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Sonda que abre uma conexão TCP com um endereço conhecido.
#[derive(Debug, Clone)]
pub struct TcpConnectivity {
    addr: String,
    timeout: Duration,
}

impl TcpConnectivity {
    /// Cria uma sonda para `addr` (`host:porta`).
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.probe_addr.clone(), config.probe_timeout())
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivity {
    async fn is_connected(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.addr.as_str())).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, "Connectivity probe failed: {}", e);
                false
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, "Connectivity probe timed out");
                false
            }
        }
    }
}
