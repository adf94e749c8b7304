//! tchains CLI: build transmission chains from a relationship export.
//!
//! Usage:
//!   tchains build --input rels.json [--follow-up-period N] [--now TS] [--pretty]
//!   tchains count --input rels.json [--follow-up-period N] [--now TS]
//!   tchains worker        (one JSON request per stdin line, one response per stdout line)

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use transmission_chains::{
    encode_response, parse_contact_date, ChainWorker, EngineConfig, Function, Relationship,
    Request, WorkerHost,
};

#[derive(Parser)]
#[command(
    name = "tchains",
    version,
    about = "Transmission chain builder for outbreak contact data"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full chain network (nodes, edges, chains)
    Build(BuildArgs),
    /// Count chains and active chains only
    Count(BuildArgs),
    /// Serve requests over stdin/stdout, one JSON document per line
    Worker,
}

#[derive(Args)]
struct BuildArgs {
    /// JSON array of relationships ("-" for stdin)
    #[arg(long, short)]
    input: PathBuf,
    /// Follow-up period in days (defaults to the configured value)
    #[arg(long)]
    follow_up_period: Option<u32>,
    /// Pin "now" (RFC 3339 or YYYY-MM-DD) for reproducible activity flags
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_contact_date(raw)
}

fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_relationships(path: &Path) -> Result<Vec<Relationship>, String> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid relationships in {}: {}", path.display(), e))
}

fn host(config: &EngineConfig) -> Result<WorkerHost, String> {
    WorkerHost::new(ChainWorker::new(&config.worker))
        .map_err(|e| format!("failed to create tokio runtime: {}", e))
}

fn cmd_build(config: &EngineConfig, function: Function, args: BuildArgs) -> i32 {
    let relationships = match read_relationships(&args.input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let host = match host(config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let period = args.follow_up_period.unwrap_or(config.follow_up_period);
    info!(?function, relationships = relationships.len(), period, "building chains");

    let mut request = Request::new(function, relationships, period);
    if let Some(now) = args.now {
        request = request.at(now);
    }

    let result = match host.handle(request).into_result() {
        Ok(result) => result,
        Err(e) => {
            // Dropping the host abandons a job that is still running
            if e.is_fatal() {
                warn!(code = %e.code, "abandoning unfinished build");
            }
            error!(code = %e.code, "build failed");
            eprintln!("Error: {}", e.message);
            return 1;
        }
    };

    let encoded = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    };
    match encoded {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_worker(config: &EngineConfig) -> i32 {
    let host = match host(config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    info!(timeout = ?host.worker().timeout(), "worker ready");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error: failed to read request: {}", e);
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = host.respond(&line);
        if writeln!(stdout, "{}", encode_response(&response))
            .and_then(|_| stdout.flush())
            .is_err()
        {
            return 1;
        }
        // A timed-out or crashed job may still be running; exit so the
        // supervisor can start a clean worker.
        if response.is_fatal() {
            error!("worker job did not finish, shutting down");
            return 1;
        }
    }
    0
}

fn main() {
    let cli = Cli::parse();
    let config = match EngineConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_filter);

    let code = match cli.command {
        Commands::Build(args) => cmd_build(&config, Function::Build, args),
        Commands::Count(args) => cmd_build(&config, Function::Count, args),
        Commands::Worker => cmd_worker(&config),
    };
    std::process::exit(code);
}
