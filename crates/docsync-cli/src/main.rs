//! # docsync CLI
//!
//! Command-line access to a docsync server.

use anyhow::{bail, Context, Result};
use docsync_client::{lww_write, observed_tags, orset_add, orset_remove, ClientConfig, DocClient};
use serde_json::Value;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let mut config = ClientConfig::default();
    if let Ok(url) = env::var("DOCSYNC_URL") {
        config.base_url = url;
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        cmd => {
            let client = DocClient::new(config).context("Failed to create client")?;
            run(&client, cmd, &args[2..]).await
        }
    }
}

async fn run(client: &DocClient, cmd: &str, args: &[String]) -> Result<()> {
    match (cmd, args) {
        ("health", []) => print_json(&client.health().await?),
        ("list", []) => print_json(&client.list_docs().await?),
        ("put", [doc_id, kind]) => print_json(&client.put_doc(doc_id, kind, None).await?),
        ("put", [doc_id, kind, snapshot]) => {
            let snapshot = parse_json(snapshot)?;
            print_json(&client.put_doc(doc_id, kind, Some(snapshot)).await?)
        }
        ("get", [doc_id]) => print_json(&client.get_doc(doc_id).await?),
        ("ops", [doc_id]) => print_json(&client.ops_since(doc_id, 0).await?),
        ("ops", [doc_id, since]) => {
            let since: i64 = since.parse().context("since must be an integer")?;
            print_json(&client.ops_since(doc_id, since).await?)
        }
        ("write", [doc_id, value, ts, node_id]) => {
            let value = parse_json(value)?;
            let ts: i64 = ts.parse().context("ts must be an integer")?;
            let op = lww_write(value, ts, node_id.as_str());
            print_json(&client.post_ops(doc_id, 0, &[op]).await?)
        }
        ("add", [doc_id, item]) => {
            let op = orset_add(item.as_str());
            print_json(&client.post_ops(doc_id, 0, &[op]).await?)
        }
        ("remove", [doc_id, item]) => {
            let log = client.ops_since(doc_id, 0).await?;
            let seen = observed_tags(&log.ops, item);
            let op = orset_remove(item.as_str(), seen);
            print_json(&client.post_ops(doc_id, log.version, &[op]).await?)
        }
        ("apply", [doc_id, ops]) => {
            let ops = match parse_json(ops)? {
                Value::Array(ops) => ops,
                other => vec![other],
            };
            print_json(&client.post_raw_ops(doc_id, 0, &ops).await?)
        }
        (cmd, _) => {
            print_help();
            bail!("Unknown command or wrong arguments: {cmd}");
        }
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    // Anything that is not JSON is taken as a plain string.
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to render response")?;
    println!("{text}");
    Ok(())
}

fn print_help() {
    println!(
        r#"docsync CLI

USAGE:
    docsync <COMMAND> [ARGS]

COMMANDS:
    health                          Check the server
    list                            List document ids
    put <doc> <lww|orset> [seed]    Create or replace a document
    get <doc>                       Show version and snapshot
    ops <doc> [since]               Show the op-log after a version
    write <doc> <value> <ts> <node> Write a register value
    add <doc> <item>                Add an item under a fresh tag
    remove <doc> <item>             Remove every observed tag of an item
    apply <doc> <json>              Append raw JSON operations
    help                            Show this help message

ENVIRONMENT:
    DOCSYNC_URL                     Server base URL (default http://localhost:8080)

EXAMPLES:
    docsync put d1 lww '"hello"'
    docsync write d1 '"world"' 10 n1
    docsync put d2 orset '["a","b"]'
    docsync remove d2 a
"#
    );
}
