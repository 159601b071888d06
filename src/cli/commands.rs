//! Implementação dos comandos CLI do georesolver.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::CacheAction;
use crate::network::{ConnectivityProbe, TcpConnectivity};
use crate::resolver::{open_store, AddressResolver};
use crate::types::config::{CacheBackend, Config, API_KEY_ENV_VARS, CONFIG_FILE_NAME};
use crate::ResolverResult;

const DATA_DIR: &str = ".georesolver/";
const GITIGNORE_COMMENT: &str = "# georesolver - local address cache";

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> ResolverResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    // Create directory if it doesn't exist
    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use 'georesolver config' to modify.");
        return Ok(());
    }

    // Create .georesolver/ directory for the cache database
    let data_dir = target_dir.join(DATA_DIR);
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("{} directory created", DATA_DIR);
    }

    update_gitignore(&target_dir)?;

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("georesolver initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!("Cache directory: {}", DATA_DIR);
    println!();
    println!("Next steps:");
    println!(
        "  1. Set the API key: export {}=<key> (or 'georesolver config')",
        API_KEY_ENV_VARS[0]
    );
    println!("  2. Check the setup: georesolver doctor");
    println!("  3. Try it: georesolver geocode \"Av. Paulista, 1000\"");

    Ok(())
}

/// Updates or creates .gitignore to include .georesolver/
fn update_gitignore(target_dir: &Path) -> ResolverResult<()> {
    let gitignore_path = target_dir.join(".gitignore");
    let bare_entry = DATA_DIR.trim_end_matches('/');

    if gitignore_path.exists() {
        let content = std::fs::read_to_string(&gitignore_path)?;

        if content
            .lines()
            .any(|line| line.trim() == DATA_DIR || line.trim() == bare_entry)
        {
            tracing::debug!(".gitignore already contains {}", DATA_DIR);
            return Ok(());
        }

        let mut new_content = content.trim_end().to_string();
        if !new_content.is_empty() {
            new_content.push_str("\n\n");
        }
        new_content.push_str(GITIGNORE_COMMENT);
        new_content.push('\n');
        new_content.push_str(DATA_DIR);
        new_content.push('\n');

        std::fs::write(&gitignore_path, new_content)?;
        println!(".gitignore updated with {}", DATA_DIR);
    } else {
        let content = format!("{}\n{}\n", GITIGNORE_COMMENT, DATA_DIR);
        std::fs::write(&gitignore_path, content)?;
        println!(".gitignore created with {}", DATA_DIR);
    }

    Ok(())
}

/// Resolve um endereço e imprime `lat,lng`.
pub async fn geocode(address: &str, config: &Config) -> ResolverResult<()> {
    let resolver = AddressResolver::from_config(config)?;

    let point = with_spinner(
        format!("Geocodificando \"{}\"...", address.trim()),
        resolver.geocode_address(address),
    )
    .await?;

    tracing::info!(%point, "Address resolved");
    println!("{}", point);
    Ok(())
}

/// Resolve coordenadas e imprime o endereço.
pub async fn reverse(
    latitude: f64,
    longitude: f64,
    retries: Option<u32>,
    config: &Config,
) -> ResolverResult<()> {
    let resolver = AddressResolver::from_config(config)?;
    let retries = retries.unwrap_or(resolver.settings().reverse_retries);

    let address = with_spinner(
        format!("Buscando endereço de {},{}...", latitude, longitude),
        resolver.reverse_geocode_with_retries(latitude, longitude, retries),
    )
    .await?;

    tracing::info!(latitude, longitude, "Coordinates resolved");
    println!("{}", address);
    Ok(())
}

/// Imprime uma sugestão por linha.
pub async fn suggest(input: &str, config: &Config) -> ResolverResult<()> {
    let resolver = AddressResolver::from_config(config)?;

    let suggestions = with_spinner(
        format!("Buscando sugestões para \"{}\"...", input.trim()),
        resolver.place_suggestions(input),
    )
    .await;

    tracing::info!(count = suggestions.len(), "Suggestions fetched");
    for suggestion in suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}

/// Manutenção do cache local.
pub async fn cache_cmd(action: CacheAction, config: &Config) -> ResolverResult<()> {
    let resolver = AddressResolver::from_config(config)?;

    match action {
        CacheAction::Stats => {
            let stats = resolver.cache_stats();
            println!("Cache ({})", stats.backend);
            println!("  Total de entradas: {}", stats.total_entries);
            for ns in [&stats.geocode, &stats.reverse, &stats.suggestions] {
                println!("  {:<10} {} entradas", ns.namespace, ns.entries);
            }
        }
        CacheAction::Sweep => {
            let removed = resolver.sweep_expired();
            println!("{} entradas vencidas removidas.", removed);
        }
        CacheAction::Clear => {
            let removed = resolver.clear_cache();
            println!("{} entradas removidas.", removed);
        }
    }

    Ok(())
}

/// Configura opções interativamente.
pub async fn config_cmd(config_path: &Path) -> ResolverResult<()> {
    use super::interactive::{run_interactive_config, show_config_summary};

    // Mostra resumo antes de editar
    if config_path.exists() {
        let config = Config::load(config_path)?;
        show_config_summary(&config);
    }

    run_interactive_config(config_path)
}

/// Diagnostica problemas de configuração.
pub async fn doctor(config: &Config) -> ResolverResult<()> {
    println!("Diagnosticando configuração do georesolver...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    println!("✓ Configuração carregada");

    if config.provider.has_api_key() {
        println!("✓ Chave da API configurada");
    } else {
        issues.push(format!(
            "Chave da API ausente (defina {} ou provider.api_key)",
            API_KEY_ENV_VARS[0]
        ));
    }

    match open_store(config) {
        Ok(store) => {
            let entries = store.len().unwrap_or(0);
            match config.cache.backend {
                CacheBackend::Sqlite => println!(
                    "✓ Cache {} em {} ({} entradas)",
                    store.name(),
                    config.cache.db_path.display(),
                    entries
                ),
                CacheBackend::Memory => {
                    println!("✓ Cache {} ({} entradas)", store.name(), entries);
                    warnings.push("Cache em memória não persiste entre execuções".to_string());
                }
            }
        }
        Err(e) => issues.push(format!("Não foi possível abrir o cache: {}", e)),
    }

    if config.network.probe_enabled {
        let probe = TcpConnectivity::from_config(&config.network);
        if probe.is_connected().await {
            println!("✓ Conectividade com {}", probe.addr());
        } else {
            warnings.push(format!(
                "Sem conectividade com {}: consultas fora do cache vão falhar",
                probe.addr()
            ));
        }
    } else {
        println!("○ Verificação de conectividade desabilitada no config");
    }

    // Resumo
    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ Tudo OK! georesolver está pronto para uso.");
    } else {
        if !warnings.is_empty() {
            println!("Avisos:");
            for warning in warnings {
                println!("  ⚠ {}", warning);
            }
        }
        if !issues.is_empty() {
            println!("Problemas:");
            for issue in issues {
                println!("  ✗ {}", issue);
            }
        }
    }

    Ok(())
}

/// Mostra versão.
pub fn version() {
    println!("georesolver {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Geocodificação direta, reversa e sugestões de endereço com cache local");
}

/// Mostra um spinner em stderr enquanto `work` executa.
async fn with_spinner<T>(message: String, work: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = work.await;
    spinner.finish_and_clear();
    output
}
