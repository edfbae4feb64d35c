use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use modserver::config::{LogFormat, ServerConfig};

#[derive(Parser)]
#[command(name = "modserver")]
#[command(version, about = "Read-only Go module proxy serving a local module directory")]
struct Cli {
    /// Directory holding `<module>@<version>` directories
    mod_dir: Option<PathBuf>,

    /// Address to listen on (e.g., 127.0.0.1:8080)
    addr: Option<String>,

    /// JSON configuration file; command-line arguments take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Deadline for a single request in milliseconds
    #[arg(long)]
    request_timeout_ms: Option<u64>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Log filter directives (overridden by RUST_LOG)
    #[arg(long)]
    log_filter: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(mod_dir) = self.mod_dir {
            config.mod_dir = Some(mod_dir);
        }
        if let Some(addr) = self.addr {
            config.addr = Some(addr);
        }
        if let Some(timeout) = self.request_timeout_ms {
            config.request_timeout_ms = timeout;
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
        if let Some(filter) = self.log_filter {
            config.log.filter = filter;
        }
        if let Some(file) = self.log_file {
            config.log.file = Some(file);
        }

        Ok(config)
    }
}

fn usage() -> &'static str {
    "usage: modserver [mod-directory] [address]"
}

fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config
        .validated_mod_dir()
        .and_then(|_| config.validated_addr())
    {
        eprintln!("{}", e);
        eprintln!("{}", usage());
        return ExitCode::FAILURE;
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ServerConfig) -> anyhow::Result<()> {
    let _log_guard = modserver::logging::init_logging(&config.log)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(modserver::proxy::server::run_server(config))
}
