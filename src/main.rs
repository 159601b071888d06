use clap::Parser;
use georesolver::cli::{commands, Cli, Commands};
use georesolver::types::config::Config;
use georesolver::ResolverResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config_result = if cli.config.exists() {
        Config::load(&cli.config)
    } else {
        Ok(Config::load_or_default())
    };
    let (config, load_error) = match config_result {
        Ok(config) => (config, None),
        Err(e) => (Config::default_config(), Some(e)),
    };
    let config = config.with_env_overrides();

    // Determine log level: CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("georesolver={}", log_level)
            .parse()
            .unwrap_or_else(|_| "georesolver=info".parse().expect("fallback directive is valid")),
    );

    let json = config.general.log_format == "json";
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    if let Some(e) = load_error {
        tracing::warn!(
            "Invalid configuration at {}, using defaults: {}",
            cli.config.display(),
            e
        );
    } else {
        tracing::debug!("Configuration loaded from: {}", cli.config.display());
    }

    if let Err(e) = run(cli, config).await {
        eprintln!("Erro: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> ResolverResult<()> {
    match cli.command {
        Commands::Init { path } => commands::init(path).await,
        Commands::Geocode { address } => commands::geocode(&address.join(" "), &config).await,
        Commands::Reverse {
            latitude,
            longitude,
            retries,
        } => commands::reverse(latitude, longitude, retries, &config).await,
        Commands::Suggest { input } => commands::suggest(&input.join(" "), &config).await,
        Commands::Cache { action } => commands::cache_cmd(action, &config).await,
        Commands::Config => commands::config_cmd(&cli.config).await,
        Commands::Doctor => commands::doctor(&config).await,
        Commands::Version => {
            commands::version();
            Ok(())
        }
    }
}
