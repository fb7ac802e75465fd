use std::env;
use std::process;

use serde_json::{json, Value};
use tracing::{info, Level};
use tsdb_client::{logging, Order, QueryOptions, Result, TsdbClient, WriteOptions};

const USAGE: &str = "usage:
  tsdb query <series> [limit] [offset] [asc|desc]
  tsdb write <series> <value> [time] [ttl]
  tsdb asyncwrite <series> <value> [time] [ttl]
  tsdb delete <series>
  tsdb deletebytime <series> <time>
  tsdb count <series>
  tsdb stats
  tsdb backup <file>

endpoint: TSDB_HOST, TSDB_PORT, TSDB_BASE (default localhost:4080/api/v1/)";

#[tokio::main]
async fn main() {
    logging::init_logger(Level::WARN);

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((operation, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    let client = match TsdbClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match run(&client, operation, rest).await {
        Ok(Some(output)) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        Ok(None) => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("{} error: {}", e.kind().as_str(), e);
            process::exit(1);
        }
    }
}

/// `Ok(None)` means the arguments did not match any command.
async fn run(client: &TsdbClient, operation: &str, args: &[String]) -> Result<Option<Value>> {
    let arg = |i: usize| args.get(i).map(String::as_str);

    let output = match (operation, arg(0)) {
        ("query", Some(series)) => {
            let Some(opts) = query_options(&args[1..]) else {
                return Ok(None);
            };
            client.query(series, &opts).await?
        }
        ("write" | "asyncwrite", Some(series)) => {
            let Some(value) = arg(1) else {
                return Ok(None);
            };
            let mut opts = WriteOptions::default();
            if let Some(time) = arg(2) {
                opts = opts.time(time);
            }
            if let Some(ttl) = arg(3) {
                opts = opts.ttl(ttl);
            }
            let ok = if operation == "write" {
                client.write(series, value, &opts).await?
            } else {
                client.asyncwrite(series, value, &opts).await?
            };
            json!(ok)
        }
        ("delete", Some(series)) => json!(client.delete(series).await?),
        ("deletebytime", Some(series)) => {
            let Some(time) = arg(1) else {
                return Ok(None);
            };
            json!(client.deletebytime(series, time).await?)
        }
        ("count", Some(series)) => json!(client.count(series).await?),
        ("stats", None) => client.stats().await?,
        ("backup", Some(path)) => {
            let snapshot = client.backup().await?;
            tokio::fs::write(path, &snapshot).await?;
            info!("wrote {} bytes to {}", snapshot.len(), path);
            json!({ "path": path, "bytes": snapshot.len() })
        }
        _ => return Ok(None),
    };

    Ok(Some(output))
}

fn query_options(args: &[String]) -> Option<QueryOptions> {
    let mut opts = QueryOptions::default();
    if let Some(limit) = args.first() {
        opts = opts.limit(limit.parse().ok()?);
    }
    if let Some(offset) = args.get(1) {
        opts = opts.offset(offset.parse().ok()?);
    }
    if let Some(order) = args.get(2) {
        opts = opts.order(order.parse::<Order>().ok()?);
    }
    Some(opts)
}
