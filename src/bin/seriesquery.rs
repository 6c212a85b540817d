use clap::{Parser, Subcommand};
use seriesquery::config::ServiceConfig;
use seriesquery::service::EmptyFilterPolicy;
use seriesquery::transport::{envelope_line, serve_lines};
use seriesquery::{RawRequest, bootstrap, init_logging};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "seriesquery", version, about = "Query surface over a series document store", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, defaults are used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "NDJSON file to load the store from. Takes precedence over config/env.")]
    data: Option<PathBuf>,
    #[arg(long, help = "Unbounded requests with an empty query: count-only|return-all|omit")]
    empty_filter: Option<EmptyFilterPolicy>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run one request and print its envelope as JSON")]
    Query {
        #[arg(long, default_value = "", help = "Query text, e.g. 'city=Recife name=\"a b\"'")]
        query: String,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true, help = "-1 all, 0 count only, N at most N")]
        len: i64,
        #[arg(long, help = "Field to list distinct values for; repeatable. 'fields' lists field names")]
        distinct: Vec<String>,
        #[arg(long, help = "Pretty-print the envelope")]
        pretty: bool,
    },
    #[command(about = "List the field names present in documents matching a query")]
    Keys {
        #[arg(long, default_value = "")]
        query: String,
    },
    #[command(name = "serve-stdio", about = "Read one JSON request per line on stdin, answer on stdout")]
    ServeStdio,
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let mut cfg = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(p) = &cli.data {
        cfg.data_path = Some(p.clone());
    }
    if let Some(p) = cli.empty_filter {
        cfg.empty_filter_policy = Some(p);
    }
    if let Some(l) = &cli.log_level {
        cfg.log_level = Some(l.clone());
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&cfg) {
        eprintln!("warning: logging disabled: {e}");
    }
    let (_store, service) = match bootstrap(&cfg) {
        Ok(v) => v,
        Err(e) => {
            log::error!("startup failed: {e}");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Query { query, len, distinct, pretty } => {
            let distinct = if distinct.is_empty() { None } else { Some(distinct) };
            let env = service.handle(RawRequest::new(&query, len, distinct)).await;
            let out = if pretty {
                serde_json::to_string_pretty(&env).unwrap_or_else(|_| envelope_line(&env))
            } else {
                envelope_line(&env)
            };
            println!("{out}");
            if env.is_success() { ExitCode::SUCCESS } else { ExitCode::from(2) }
        }
        Commands::Keys { query } => {
            let env = service.handle(RawRequest::new(&query, 0, Some(vec!["fields".into()]))).await;
            match env.distinct().and_then(|d| d.get("fields")) {
                Some(keys) => {
                    for k in keys.iter().filter_map(bson::Bson::as_str) {
                        println!("{k}");
                    }
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("error: {}", env.error_message().unwrap_or("no keys returned"));
                    ExitCode::from(2)
                }
            }
        }
        Commands::ServeStdio => {
            let reader = tokio::io::BufReader::new(tokio::io::stdin());
            match serve_lines(Arc::new(service), reader, tokio::io::stdout()).await {
                Ok(n) => {
                    log::info!("stdio transport closed after {n} requests");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
