use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::{error, info};

use mailboy::config::{load_run_config, RunConfig};
use mailboy::error::{ConfigError, MailboyError, Result};
use mailboy::worker::{self, RunMode};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish accepted messages to the list
    Run {
        #[command(flatten)]
        dirs: Dirs,

        /// When to look for accepted messages
        #[arg(short, long, value_enum, default_value_t = RunMode::Single)]
        mode: RunMode,

        /// Seconds between passes in poll mode
        #[arg(long, default_value_t = 10)]
        poll_interval: u64,

        /// Directory for log files [default: <workdir>/log]
        #[arg(long, env = "MAILBOY_LOGDIR")]
        logdir: Option<PathBuf>,
    },
    /// Load and validate the configuration without connecting anywhere
    CheckConfig {
        #[command(flatten)]
        dirs: Dirs,
    },
}

#[derive(Args, Debug)]
struct Dirs {
    /// Base directory for the default conf and log locations
    #[arg(short, long, env = "MAILBOY_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Directory holding mailboy.yaml and the recipient list [default: <workdir>/conf]
    #[arg(short, long, env = "MAILBOY_CONFDIR")]
    confdir: Option<PathBuf>,
}

impl Dirs {
    fn confdir(&self) -> PathBuf {
        self.confdir
            .clone()
            .unwrap_or_else(|| self.workdir.join("conf"))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            dirs,
            mode,
            poll_interval,
            logdir,
        } => {
            let logdir = logdir.unwrap_or_else(|| dirs.workdir.join("log"));
            run(&dirs.confdir(), &logdir, mode, Duration::from_secs(poll_interval))
        }
        Command::CheckConfig { dirs } => check_config(&dirs.confdir()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(confdir: &Path, logdir: &Path, mode: RunMode, poll_interval: Duration) -> Result<()> {
    let _log_guard = mailboy::logging::init(logdir)?;

    let config = load_run_config(confdir, mode, poll_interval)?;
    info!(
        "Loaded configuration from {} (mode {}, folders {} -> {})",
        confdir.display(),
        config.mode,
        config.folders.accepted,
        config.folders.published
    );

    let (trigger, shutdown) = worker::shutdown::channel();
    trigger.install_ctrlc()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(MailboyError::Runtime)?;

    let summary = runtime.block_on(worker::run(&config, shutdown))?;
    if summary.interrupted {
        info!("Stopped on request after {} passes", summary.passes);
    } else {
        info!("Finished after {} passes", summary.passes);
    }
    Ok(())
}

fn check_config(confdir: &Path) -> Result<()> {
    let config = load_run_config(confdir, RunMode::Single, Duration::from_secs(10))?;
    resolve_credentials(&config)?;
    let recipients = config.recipients.recipients()?;

    println!("Configuration in {} is valid", confdir.display());
    println!(
        "  IMAP:        {}@{}:{}",
        config.imap.username, config.imap.host, config.imap.port
    );
    println!(
        "  SMTP:        {}@{}:{}",
        config.smtp.username, config.smtp.host, config.smtp.port
    );
    println!("  List:        {}", config.smtp.list_address);
    println!(
        "  Folders:     {} -> {}",
        config.folders.accepted, config.folders.published
    );
    println!("  Prefix:      {}", config.subject_prefix);
    println!("  Recipients:  {}", recipients.len());
    println!("  IDLE timeout: {}s", config.idle_timeout.as_secs());
    Ok(())
}

fn resolve_credentials(config: &RunConfig) -> std::result::Result<(), ConfigError> {
    config
        .imap
        .auth
        .resolve()
        .map_err(|source| ConfigError::Secret {
            account: format!("IMAP account {}", config.imap.username),
            source,
        })?;
    config
        .smtp
        .auth
        .resolve()
        .map_err(|source| ConfigError::Secret {
            account: format!("SMTP account {}", config.smtp.username),
            source,
        })?;
    Ok(())
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = format!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    out
}
