//! Configuração interativa do georesolver.
//!
//! Este módulo implementa a configuração interativa usando dialoguer.

use std::path::{Path, PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};

use crate::types::config::{CacheBackend, Config};
use crate::ResolverResult;

/// Executa a configuração interativa.
pub fn run_interactive_config(config_path: &Path) -> ResolverResult<()> {
    let theme = ColorfulTheme::default();

    println!("\n🔧 Configuração Interativa do georesolver\n");

    // Carrega config existente ou cria nova
    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        println!("Criando nova configuração...\n");
        Config::default_config()
    };

    // Menu principal
    loop {
        let options = vec![
            "Configurações Gerais",
            "Provedor (Google Maps)",
            "Consultas (retentativas, sugestões)",
            "Cache",
            "Rede",
            "Salvar e Sair",
            "Sair sem Salvar",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("O que deseja configurar?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => configure_general(&theme, &mut config)?,
            1 => configure_provider(&theme, &mut config)?,
            2 => configure_resolver(&theme, &mut config)?,
            3 => configure_cache(&theme, &mut config)?,
            4 => configure_network(&theme, &mut config)?,
            5 => {
                config.save(config_path)?;
                println!("\n✓ Configuração salva em: {}\n", config_path.display());
                break;
            }
            6 => {
                if Confirm::with_theme(&theme)
                    .with_prompt("Deseja realmente sair sem salvar?")
                    .default(false)
                    .interact()?
                {
                    println!("\nSaindo sem salvar.\n");
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Configura opções gerais.
fn configure_general(theme: &ColorfulTheme, config: &mut Config) -> ResolverResult<()> {
    println!("\n📋 Configurações Gerais\n");

    let log_levels = vec!["error", "warn", "info", "debug", "trace"];
    let current_idx = log_levels
        .iter()
        .position(|&l| l == config.general.log_level)
        .unwrap_or(2);

    let log_level_idx = Select::with_theme(theme)
        .with_prompt("Nível de log")
        .items(&log_levels)
        .default(current_idx)
        .interact()?;

    config.general.log_level = log_levels[log_level_idx].to_string();

    let log_formats = vec!["text", "json"];
    let current_format_idx = log_formats
        .iter()
        .position(|&f| f == config.general.log_format)
        .unwrap_or(0);

    let log_format_idx = Select::with_theme(theme)
        .with_prompt("Formato de log")
        .items(&log_formats)
        .default(current_format_idx)
        .interact()?;

    config.general.log_format = log_formats[log_format_idx].to_string();

    println!("\n✓ Configurações gerais atualizadas.\n");
    Ok(())
}

/// Configura o provedor.
fn configure_provider(theme: &ColorfulTheme, config: &mut Config) -> ResolverResult<()> {
    println!("\n🗺️  Configuração do Provedor\n");

    let change_key = !config.provider.has_api_key()
        || Confirm::with_theme(theme)
            .with_prompt("Alterar a chave da API?")
            .default(false)
            .interact()?;

    if change_key {
        let api_key = Password::with_theme(theme)
            .with_prompt("Chave da API do Google Maps")
            .allow_empty_password(true)
            .interact()?;
        config.provider.api_key = api_key.trim().to_string();
    }

    let region: String = Input::with_theme(theme)
        .with_prompt("Região (ccTLD)")
        .default(config.provider.region.clone())
        .interact_text()?;
    config.provider.region = region;

    let language: String = Input::with_theme(theme)
        .with_prompt("Idioma das respostas")
        .default(config.provider.language.clone())
        .interact_text()?;
    config.provider.language = language;

    let types: String = Input::with_theme(theme)
        .with_prompt("Tipos de lugar nas sugestões")
        .default(config.provider.suggestion_types.clone())
        .interact_text()?;
    config.provider.suggestion_types = types;

    let timeout: u64 = Input::with_theme(theme)
        .with_prompt("Timeout por requisição (segundos)")
        .default(config.provider.timeout_secs)
        .interact_text()?;
    config.provider.timeout_secs = timeout.max(1);

    println!("\n✓ Provedor configurado.\n");
    Ok(())
}

/// Configura as consultas.
fn configure_resolver(theme: &ColorfulTheme, config: &mut Config) -> ResolverResult<()> {
    println!("\n🔁 Configuração das Consultas\n");

    let retries: u32 = Input::with_theme(theme)
        .with_prompt("Retentativas da geocodificação reversa")
        .default(config.resolver.reverse_retries)
        .interact_text()?;
    config.resolver.reverse_retries = retries;

    let delay: u64 = Input::with_theme(theme)
        .with_prompt("Intervalo entre tentativas (ms)")
        .default(config.resolver.retry_delay_ms)
        .interact_text()?;
    config.resolver.retry_delay_ms = delay;

    let min_chars: usize = Input::with_theme(theme)
        .with_prompt("Mínimo de caracteres para sugestões")
        .default(config.resolver.min_suggestion_chars)
        .interact_text()?;
    config.resolver.min_suggestion_chars = min_chars;

    println!("\n✓ Consultas configuradas.\n");
    Ok(())
}

/// Configura cache.
fn configure_cache(theme: &ColorfulTheme, config: &mut Config) -> ResolverResult<()> {
    println!("\n💾 Configuração do Cache\n");

    let backends = vec!["SQLite (persistente)", "Memória"];
    let current_idx = match config.cache.backend {
        CacheBackend::Sqlite => 0,
        CacheBackend::Memory => 1,
    };

    let backend_idx = Select::with_theme(theme)
        .with_prompt("Armazenamento")
        .items(&backends)
        .default(current_idx)
        .interact()?;

    config.cache.backend = match backend_idx {
        0 => CacheBackend::Sqlite,
        _ => CacheBackend::Memory,
    };

    if config.cache.backend == CacheBackend::Sqlite {
        let db_path: String = Input::with_theme(theme)
            .with_prompt("Caminho do banco de dados")
            .default(config.cache.db_path.display().to_string())
            .interact_text()?;
        config.cache.db_path = PathBuf::from(db_path);
    }

    let max_entries: usize = Input::with_theme(theme)
        .with_prompt("Máximo de entradas")
        .default(config.cache.max_entries)
        .interact_text()?;
    config.cache.max_entries = max_entries;

    let geocode_ttl: u64 = Input::with_theme(theme)
        .with_prompt("Tempo de vida de endereços e coordenadas (segundos)")
        .default(config.cache.geocode_ttl_secs)
        .interact_text()?;
    config.cache.geocode_ttl_secs = geocode_ttl;

    let suggestion_ttl: u64 = Input::with_theme(theme)
        .with_prompt("Tempo de vida das sugestões (segundos)")
        .default(config.cache.suggestion_ttl_secs)
        .interact_text()?;
    config.cache.suggestion_ttl_secs = suggestion_ttl;

    println!("\n✓ Cache configurado.\n");
    Ok(())
}

/// Configura a sonda de rede.
fn configure_network(theme: &ColorfulTheme, config: &mut Config) -> ResolverResult<()> {
    println!("\n📡 Configuração de Rede\n");

    config.network.probe_enabled = Confirm::with_theme(theme)
        .with_prompt("Verificar conectividade antes das consultas?")
        .default(config.network.probe_enabled)
        .interact()?;

    if !config.network.probe_enabled {
        println!("Verificação desabilitada: consultas sempre tentam a rede.\n");
        return Ok(());
    }

    let addr: String = Input::with_theme(theme)
        .with_prompt("Endereço testado (host:porta)")
        .default(config.network.probe_addr.clone())
        .interact_text()?;
    config.network.probe_addr = addr;

    let timeout: u64 = Input::with_theme(theme)
        .with_prompt("Timeout da verificação (ms)")
        .default(config.network.probe_timeout_ms)
        .interact_text()?;
    config.network.probe_timeout_ms = timeout;

    println!("\n✓ Rede configurada.\n");
    Ok(())
}

/// Mostra resumo da configuração.
pub fn show_config_summary(config: &Config) {
    println!("\n📊 Resumo da Configuração\n");
    println!("┌─────────────────────────────────────────┐");
    println!("│ Geral                                   │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Log level: {:<28} │", config.general.log_level);
    println!("│ Log format: {:<27} │", config.general.log_format);
    println!("├─────────────────────────────────────────┤");
    println!("│ Provedor                                │");
    println!("├─────────────────────────────────────────┤");
    println!(
        "│ Chave da API: {:<25} │",
        if config.provider.has_api_key() {
            "configurada"
        } else {
            "ausente"
        }
    );
    println!(
        "│ Região/idioma: {:<24} │",
        format!("{} / {}", config.provider.region, config.provider.language)
    );
    println!("│ Timeout: {:<29}s │", config.provider.timeout_secs);
    println!("├─────────────────────────────────────────┤");
    println!("│ Consultas                               │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Retentativas: {:<25} │", config.resolver.reverse_retries);
    println!(
        "│ Intervalo: {:<26}ms │",
        config.resolver.retry_delay_ms
    );
    println!(
        "│ Mín. p/ sugestões: {:<20} │",
        config.resolver.min_suggestion_chars
    );
    println!("├─────────────────────────────────────────┤");
    println!("│ Cache                                   │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Backend: {:<30} │", config.cache.backend.to_string());
    if config.cache.backend == CacheBackend::Sqlite {
        println!(
            "│ Banco: {:<32} │",
            config.cache.db_path.display().to_string()
        );
    }
    println!("│ Máx. entradas: {:<24} │", config.cache.max_entries);
    println!("│ TTL endereços: {:<23}s │", config.cache.geocode_ttl_secs);
    println!("│ TTL sugestões: {:<23}s │", config.cache.suggestion_ttl_secs);
    println!("├─────────────────────────────────────────┤");
    println!("│ Rede                                    │");
    println!("├─────────────────────────────────────────┤");
    println!(
        "│ Verificação: {:<26} │",
        if config.network.probe_enabled {
            config.network.probe_addr.as_str()
        } else {
            "desabilitada"
        }
    );
    println!("└─────────────────────────────────────────┘");
    println!();
}
