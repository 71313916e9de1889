use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::auth::TicketValue;
use crate::checksum::{checksum, CallArgument, ChecksumPreset};
use crate::client::MspClient;
use crate::gateway::{ClientConfig, Server};
use crate::utils::init_logging;

/// Command line front end for the gateway client.
#[derive(Parser)]
#[clap(name = "msp-gateway", version)]
pub struct Cli {
    /// Default log filter (RUST_LOG overrides it)
    #[clap(long, default_value = "info")]
    pub log: String,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Print the checksum of a JSON parameter list
    Checksum {
        /// JSON array of call arguments
        #[clap(long)]
        params: String,

        #[clap(long)]
        salt: Option<String>,

        #[clap(long = "no-ticket")]
        no_ticket: Option<String>,
    },
    /// Send a raw call and print the decoded result
    Call {
        #[clap(long)]
        server: Server,

        #[clap(long)]
        method: String,

        /// JSON array of call arguments
        #[clap(long, default_value = "[]")]
        params: String,

        /// session ticket; a signed ticket header is prepended to params
        #[clap(long)]
        ticket: Option<String>,

        #[clap(long)]
        proxy: Option<String>,

        /// TOML client configuration
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Log in and print the login status
    Login {
        #[clap(long)]
        server: Server,

        #[clap(long)]
        username: String,

        #[clap(long)]
        password: String,

        #[clap(long)]
        proxy: Option<String>,

        #[clap(long)]
        config: Option<PathBuf>,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match cli.cmd {
        Cmd::Checksum { params, salt, no_ticket } => {
            let params = parse_params(&params)?;
            let mut preset = ChecksumPreset::default();
            if let Some(salt) = salt {
                preset.salt = salt;
            }
            if let Some(no_ticket) = no_ticket {
                preset.no_ticket_value = no_ticket;
            }
            println!("{}", checksum(&params, &preset));
            Ok(())
        }
        Cmd::Call { server, method, params, ticket, proxy, config } => {
            let client = MspClient::new(load_config(config)?);
            let mut params = parse_params(&params)?;
            if let Some(ticket) = ticket {
                client.resume(server, "cli", TicketValue::parse(ticket)?);
                params.insert(0, CallArgument::Ticket(client.ticket_header()?));
            }
            let result = client.send_command(&server, &method, params, proxy.as_deref()).await?;
            println!("status: {}", result.status_code());
            match result.content() {
                Some(content) => println!("{}", serde_json::to_string_pretty(content)?),
                None => println!("(no content)"),
            }
            Ok(())
        }
        Cmd::Login { server, username, password, proxy, config } => {
            let client = MspClient::new(load_config(config)?);
            let status = client.login(&username, &password, server, proxy.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.is_logged_in() {
                bail!("login failed");
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ClientConfig> {
    match path {
        Some(path) => Ok(ClientConfig::load(path)?),
        None => Ok(ClientConfig::default()),
    }
}

fn parse_params(json: &str) -> Result<Vec<CallArgument>> {
    let value: Value = serde_json::from_str(json).context("params must be valid JSON")?;
    match value {
        Value::Array(items) => items.iter().map(argument_from_json).collect(),
        _ => bail!("params must be a JSON array"),
    }
}

/// JSON to call argument. `{"$bytes": "<hex>"}` is a byte buffer and
/// `{"$date": "YYYY-MM-DD"}` a date; other objects are mappings.
pub fn argument_from_json(value: &Value) -> Result<CallArgument> {
    Ok(match value {
        Value::Null => CallArgument::Null,
        Value::Bool(b) => CallArgument::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CallArgument::Integer(i),
            None => CallArgument::Double(n.as_f64().ok_or_else(|| anyhow!("number {} out of range", n))?),
        },
        Value::String(s) => CallArgument::Text(s.clone()),
        Value::Array(items) => {
            CallArgument::Sequence(items.iter().map(argument_from_json).collect::<Result<_>>()?)
        }
        Value::Object(map) => {
            if let (1, Some(Value::String(hex))) = (map.len(), map.get("$bytes")) {
                CallArgument::Bytes(hex::decode(hex).context("$bytes must be hex")?)
            } else if let (1, Some(Value::String(date))) = (map.len(), map.get("$date")) {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").context("$date must be YYYY-MM-DD")?;
                CallArgument::from(date)
            } else {
                CallArgument::Mapping(
                    map.iter()
                        .map(|(k, v)| argument_from_json(v).map(|arg| (k.clone(), arg)))
                        .collect::<Result<_>>()?,
                )
            }
        }
    })
}
