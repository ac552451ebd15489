use std::sync::Arc;

use anyhow::bail;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tsl_ledger::{
    AlertFilter, AlertService, AlertView, InMemoryAlertStatusStore, Ledger, LedgerReader,
    RaiseAlert, ResolutionOutcome,
};
use tsl_server::{AppState, ServerConfig, TslServer};
use tsl_store::FileChainStore;
use tsl_types::{Block, Report};

use crate::cli::*;

type FileLedger = Ledger<FileChainStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    debug!(
        command = cli.command.name(),
        store = %config.store.path.display(),
        ?format,
        "dispatching command"
    );
    match cli.command {
        Command::Init => cmd_init(&config),
        Command::Verify(args) => cmd_verify(&config, args, format),
        Command::Log(args) => cmd_log(&config, args, format),
        Command::Show(args) => cmd_show(&config, args, format),
        Command::Alerts(args) => cmd_alerts(&config, args, format),
        Command::Raise(args) => cmd_raise(&config, args, format),
        Command::Resolve(args) => cmd_resolve(&config, args, format),
        Command::Serve(args) => cmd_serve(config, args),
    }
}

/// `--config` file (or defaults), with `--ledger` taking precedence for the
/// store path.
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(path) = &cli.ledger {
        config.store.path = path.clone();
    }
    Ok(config)
}

fn open_ledger(config: &ServerConfig) -> anyhow::Result<FileLedger> {
    Ok(Ledger::open(FileChainStore::new(config.store.clone()))?)
}

/// Alert workflows over the file ledger. Status rows live only for the
/// duration of the command; resolution state is read back from the chain.
fn alert_service(config: &ServerConfig) -> anyhow::Result<AlertService<FileLedger>> {
    let ledger = Arc::new(open_ledger(config)?);
    Ok(AlertService::new(ledger, Arc::new(InMemoryAlertStatusStore::new())))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(config: &ServerConfig) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let chain = ledger.chain()?;
    println!(
        "{} Ledger ready at {}",
        "✓".green().bold(),
        config.store.path.display().to_string().bold()
    );
    println!("  Blocks: {}", chain.len().to_string().bold());
    println!("  Genesis: {}", chain.genesis().short_hash().cyan());
    println!("  Tip: {}", chain.tip().to_string().yellow());
    Ok(())
}

fn cmd_verify(config: &ServerConfig, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;

    if args.all {
        let report = ledger.validation_report()?;
        if format == OutputFormat::Json {
            print_json(&json!({
                "valid": report.is_valid(),
                "block_count": report.block_count,
                "issue_count": report.issue_count,
                "resolution_count": report.resolution_count,
                "violations": report.violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }))?;
        } else {
            println!(
                "Blocks: {} ({} issue, {} resolution)",
                report.block_count.to_string().bold(),
                report.issue_count,
                report.resolution_count
            );
            for violation in &report.violations {
                println!("  {} {}", "✗".red().bold(), violation);
            }
        }
        if !report.is_valid() {
            bail!("{} violation(s) found", report.violations.len());
        }
        if format == OutputFormat::Text {
            println!("{} Hash chain intact", "✓".green().bold());
        }
        return Ok(());
    }

    let chain = ledger.chain()?;
    match chain.validate() {
        Ok(()) => {
            if format == OutputFormat::Json {
                print_json(&json!({ "valid": true, "block_count": chain.len() }))?;
            } else {
                println!("{} Hash chain intact", "✓".green().bold());
                println!("  Blocks: {}", chain.len().to_string().bold());
                println!("  Tip: {}", chain.tip().to_string().yellow());
            }
            Ok(())
        }
        Err(violation) => {
            if format == OutputFormat::Json {
                print_json(&json!({ "valid": false, "violation": violation.to_string() }))?;
            } else {
                println!("{} {}", "✗".red().bold(), violation);
            }
            bail!("ledger failed verification")
        }
    }
}

fn cmd_log(config: &ServerConfig, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let blocks = open_ledger(config)?.chain()?.into_blocks();
    let skip = args
        .limit
        .map_or(0, |limit| blocks.len().saturating_sub(limit));
    let blocks = &blocks[skip..];

    if format == OutputFormat::Json {
        return print_json(blocks);
    }
    for block in blocks {
        if args.oneline {
            println!("{}", oneline(block));
        } else {
            print_block(block);
        }
    }
    Ok(())
}

fn oneline(block: &Block) -> String {
    let kind = block
        .block_type()
        .map_or_else(|| "genesis".to_string(), |kind| kind.to_string());
    format!(
        "{} {} {:<10} {}",
        format!("#{}", block.index).yellow(),
        block.short_hash().dimmed(),
        kind,
        block.alert_uuid().unwrap_or("")
    )
}

fn print_block(block: &Block) {
    println!("{}", render_block(block));
}

fn render_block(block: &Block) -> String {
    let mut lines = vec![
        format!("{}  {}", format!("block #{}", block.index).yellow().bold(), block.hash.dimmed()),
        format!("  Time: {}", block.timestamp.to_rfc3339()),
        format!("  Prev: {}", block.prev_hash),
    ];
    match block.payload() {
        Some(payload) => {
            lines.push(format!("  Type: {}", payload.block_type().to_string().cyan()));
            lines.push(format!("  Alert: {}", payload.alert_uuid()));
            if let Some(temp_id) = payload.temp_id() {
                lines.push(format!("  Subject: {temp_id}"));
            }
        }
        None => lines.push(format!("  Type: {}", "genesis".cyan())),
    }
    lines.push(String::new());
    lines.join("\n")
}

fn show_output(block: &Block, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_block(block)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(block)?),
    }
}

fn cmd_show(config: &ServerConfig, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let block = open_ledger(config)?.block_at(args.index)?;
    println!("{}", show_output(&block, format)?);
    Ok(())
}

fn cmd_alerts(config: &ServerConfig, args: AlertsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let filter = AlertFilter {
        unresolved_only: args.unresolved,
        temp_id: args.temp_id,
        include_resolutions: !args.no_resolutions,
    };
    let views = alert_service(config)?.views(&filter)?;

    if format == OutputFormat::Json {
        return print_json(&views);
    }
    if views.is_empty() {
        println!("No alerts.");
    }
    for view in &views {
        println!("{}", alert_line(view));
    }
    Ok(())
}

fn alert_line(view: &AlertView) -> String {
    let state = if view.resolved {
        format!(
            "resolved by {}",
            view.resolved_by.as_deref().unwrap_or("unknown")
        )
        .green()
    } else {
        "open".red().bold()
    };
    let sos = if view.sos { " SOS".red().bold().to_string() } else { String::new() };
    format!(
        "{} {} {} {:<10} {}{}",
        format!("#{}", view.block_index).yellow(),
        view.alert_uuid,
        view.temp_id.as_deref().unwrap_or("-").bold(),
        view.block_type.to_string(),
        state,
        sos
    )
}

fn cmd_raise(config: &ServerConfig, args: RaiseArgs, format: OutputFormat) -> anyhow::Result<()> {
    let request = RaiseAlert {
        temp_id: args.temp_id,
        lat: args.lat,
        lon: args.lon,
        message: args.message,
        sos: args.sos,
        report: Some(Report {
            title: args.title,
            description: args.description,
            image: args.image,
        }),
    };
    let block = alert_service(config)?.raise(request)?;

    if format == OutputFormat::Json {
        return print_json(&block);
    }
    println!("{} Alert raised", "✓".green().bold());
    println!("  Alert: {}", block.alert_uuid().unwrap_or_default().bold());
    println!("  Block: {}", block.to_string().yellow());
    Ok(())
}

fn cmd_resolve(config: &ServerConfig, args: ResolveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = alert_service(config)?.resolve(&args.alert_uuid, args.resolved_by)?;

    match outcome {
        ResolutionOutcome::Complete { status, block } => {
            if format == OutputFormat::Json {
                return print_json(&json!({ "status": status, "block": block }));
            }
            println!("{} Alert {} resolved", "✓".green().bold(), status.alert_uuid.bold());
            println!("  Block: {}", block.to_string().yellow());
            Ok(())
        }
        ResolutionOutcome::LedgerPending { error, .. } => {
            bail!("resolution was not recorded in the ledger: {error}")
        }
    }
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let state = AppState::open(&config.store, Arc::new(InMemoryAlertStatusStore::new()))?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(TslServer::new(config, state).serve())?;
    Ok(())
}
