//! Interface de linha de comando do georesolver.

pub mod commands;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// georesolver - Geocodificação direta, reversa e sugestões de endereço.
#[derive(Parser, Debug)]
#[command(name = "georesolver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "georesolver.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicializa configuração no diretório atual.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Converte um endereço em coordenadas.
    Geocode {
        /// Endereço (pode ser passado em várias palavras).
        #[arg(required = true)]
        address: Vec<String>,
    },

    /// Converte coordenadas em endereço.
    #[command(allow_negative_numbers = true)]
    Reverse {
        /// Latitude em graus decimais.
        latitude: f64,

        /// Longitude em graus decimais.
        longitude: f64,

        /// Número de retentativas (padrão: valor da configuração).
        #[arg(short, long)]
        retries: Option<u32>,
    },

    /// Sugere endereços para uma entrada parcial.
    Suggest {
        /// Texto digitado.
        #[arg(required = true)]
        input: Vec<String>,
    },

    /// Gerencia o cache local.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configura opções interativamente.
    Config,

    /// Diagnostica problemas de configuração.
    Doctor,

    /// Mostra versão.
    Version,
}

/// Ações sobre o cache.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Mostra estatísticas do cache.
    Stats,

    /// Remove entradas vencidas.
    Sweep,

    /// Remove todas as entradas.
    Clear,
}
