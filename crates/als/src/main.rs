use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use als_core::{AlsError, LoggerConfig, ServerConfig, logging, parse_log_level};
use als_server::LspServer;

#[derive(Parser)]
#[command(name = "als", about = "Alif Language Server", version)]
struct Cli {
    /// Communicate over stdin/stdout (the default)
    #[arg(long)]
    stdio: bool,

    /// Bind 127.0.0.1:PORT and serve a single client
    #[arg(long, value_name = "PORT", conflicts_with = "stdio")]
    socket: Option<u16>,

    /// Append log records to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Console log level: trace|debug|info|warn|error|critical|off
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logger_config = LoggerConfig {
        console_level: parse_log_level(&cli.log_level),
        file_level: log::LevelFilter::Debug,
        log_file: cli.log_file.clone(),
    };
    if let Err(e) = logging::init(logger_config) {
        eprintln!("als: {e}");
        return ExitCode::FAILURE;
    }

    log::info!("initializing Alif Language Server v{}", env!("CARGO_PKG_VERSION"));
    log::info!("log level set to {}", cli.log_level);

    let config = match &cli.config {
        Some(path) => match ServerConfig::load_from_file(path) {
            Ok(config) => {
                log::info!("loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using default configuration");
                ServerConfig::default()
            }
        },
        None => ServerConfig::default(),
    };

    let mut server = LspServer::new(config);
    let result = match cli.socket {
        Some(port) => {
            log::info!("starting LSP server on port {port}");
            server.run_socket(port)
        }
        None => server.run_stdio(),
    };

    match result {
        Ok(code) => {
            log::info!("server shut down with exit code {code}");
            ExitCode::from(code as u8)
        }
        Err(e) => {
            report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_fatal(e: &AlsError) {
    log::error!("fatal: {e}");
    eprintln!("als: {e}");
}
