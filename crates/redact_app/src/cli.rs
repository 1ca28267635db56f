use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine_logging::LogDestination;
use log::LevelFilter;
use redact_core::PollSettings;
use redact_engine::{AuditQuery, ClientSettings};

/// Review and redact PII in documents handled by the document service.
#[derive(Debug, Parser)]
#[command(name = "redact", version, about)]
pub struct Cli {
    /// Base URL of the document service.
    #[arg(long, env = "REDACT_SERVER_URL", default_value = "http://127.0.0.1:5000")]
    pub server_url: String,

    /// Directory for tokenized downloads and exported reports.
    #[arg(long, env = "REDACT_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Where log lines go.
    #[arg(long, env = "REDACT_LOG", value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Seconds between detection status requests.
    #[arg(long, default_value_t = 2)]
    pub poll_interval: u64,

    /// Detection status requests before giving up.
    #[arg(long, default_value_t = 60)]
    pub max_poll_attempts: u32,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a document and annotate its PII interactively.
    Open {
        path: PathBuf,
    },
    /// List audit log entries.
    Audit(AuditArgs),
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub file_id: Option<String>,
    #[arg(long)]
    pub activity_type: Option<String>,
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl LogTarget {
    pub fn destination(self) -> LogDestination {
        let file = PathBuf::from(engine_logging::DEFAULT_LOG_FILE);
        match self {
            LogTarget::File => LogDestination::File(file),
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both(file),
        }
    }
}

impl Cli {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.server_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
            ..ClientSettings::default()
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval),
            max_attempts: self.max_poll_attempts,
        }
    }
}

impl AuditArgs {
    pub fn query(&self) -> AuditQuery {
        AuditQuery {
            file_id: self.file_id.clone(),
            activity_type: self.activity_type.clone(),
            limit: Some(self.limit),
            offset: self.offset,
        }
    }
}
