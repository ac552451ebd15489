use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "tsl",
    about = "Tourist safety ledger: tamper-evident alert history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file (bind address, store settings).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger document path; overrides the configured store path.
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the ledger document with its genesis block
    Init,
    /// Verify chain integrity
    Verify(VerifyArgs),
    /// List blocks
    Log(LogArgs),
    /// Show one block
    Show(ShowArgs),
    /// List alerts merged with their resolution state
    Alerts(AlertsArgs),
    /// Raise a new alert
    Raise(RaiseArgs),
    /// Resolve an alert
    Resolve(ResolveArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Verify(_) => "verify",
            Self::Log(_) => "log",
            Self::Show(_) => "show",
            Self::Alerts(_) => "alerts",
            Self::Raise(_) => "raise",
            Self::Resolve(_) => "resolve",
            Self::Serve(_) => "serve",
        }
    }
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Report every violation instead of stopping at the first.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct LogArgs {
    /// Show only the most recent N blocks.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub index: u64,
}

#[derive(Args)]
pub struct AlertsArgs {
    #[arg(long)]
    pub unresolved: bool,
    #[arg(long)]
    pub temp_id: Option<String>,
    /// Hide rows produced by resolution blocks.
    #[arg(long)]
    pub no_resolutions: bool,
}

#[derive(Args)]
pub struct RaiseArgs {
    #[arg(long)]
    pub temp_id: String,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    #[arg(short, long)]
    pub message: Option<String>,
    #[arg(long)]
    pub sos: bool,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub alert_uuid: String,
    #[arg(long = "by")]
    pub resolved_by: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides the configured bind address.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["tsl", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn parse_global_paths() {
        let cli = Cli::try_parse_from([
            "tsl",
            "log",
            "--ledger",
            "/tmp/chain.json",
            "--config",
            "tsl.toml",
        ])
        .unwrap();
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/chain.json")));
        assert_eq!(cli.config, Some(PathBuf::from("tsl.toml")));
    }

    #[test]
    fn parse_verify_all() {
        let cli = Cli::try_parse_from(["tsl", "verify", "--all"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert!(args.all);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_raise_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "tsl", "raise", "--temp-id", "t1", "--lat", "-33.86", "--lon", "151.2", "--sos",
        ])
        .unwrap();
        if let Command::Raise(args) = cli.command {
            assert_eq!(args.temp_id, "t1");
            assert_eq!(args.lat, -33.86);
            assert!(args.sos);
            assert!(args.title.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_resolve() {
        let cli = Cli::try_parse_from(["tsl", "resolve", "a1", "--by", "op1"]).unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(args.alert_uuid, "a1");
            assert_eq!(args.resolved_by.as_deref(), Some("op1"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_alerts_filters() {
        let cli = Cli::try_parse_from(["tsl", "alerts", "--unresolved", "--no-resolutions"]).unwrap();
        if let Command::Alerts(args) = cli.command {
            assert!(args.unresolved);
            assert!(args.no_resolutions);
            assert!(args.temp_id.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["tsl", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn command_name_matches_subcommand() {
        let cli = Cli::try_parse_from(["tsl", "show", "3"]).unwrap();
        assert_eq!(cli.command.name(), "show");
    }

    #[test]
    fn parse_json_logs() {
        let cli = Cli::try_parse_from(["tsl", "--log-format", "json", "init"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
