//! SimpleBank CLI - drive the bank through a JSON-RPC node
//!
//! The node must manage the account itself (anvil, hardhat, a dev geth):
//!   simplebank session                  → {"account": "0x…", "chainId": "0xaa36a7", …}
//!   simplebank balance                  → {"value": "2.0", "wei": "…", "asOf": 1}
//!   simplebank deposit 1.5              → {"success": true, "message": "Successfully deposited 1.5 ETH", …}
//!   simplebank withdraw 0.5
//!   simplebank transfer 1 0xAbCd…1234
//!
//! Configuration:
//!   --rpc <url>            or SIMPLEBANK_RPC_URL (default http://127.0.0.1:8545)
//!   SIMPLEBANK_CONTRACT    contract address
//!   SIMPLEBANK_CHAIN_ID    required network (hex or decimal)
//!   SIMPLEBANK_POLL_MS     receipt poll interval
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context};
use serde_json::{json, Value};
use simplebank::logging::init_logging;
use simplebank::{BankClient, BankConfig, BankError, Eip1193Wallet, HttpTransport};
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use tracing::debug;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("simplebank {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if opts.command.is_none() {
        print_usage();
        return;
    }

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")
        .and_then(|rt| rt.block_on(run(&opts)));

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            let title = e.downcast_ref::<BankError>().map(BankError::title).unwrap_or("Error");
            let err = json!({"error": format!("{:#}", e), "title": title});
            eprintln!("{}", render(&err, pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let out = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    out.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    rest: Vec<String>,
    rpc_url: Option<String>,
    // Output options
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--rpc" | "-r" => {
                    if i + 1 < args.len() {
                        opts.rpc_url = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') || arg.starts_with("-.") || arg.parse::<f64>().is_ok() => {
                    positional.push(arg.clone())
                }
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.rest = positional;

        if opts.rpc_url.is_none() {
            opts.rpc_url = env::var("SIMPLEBANK_RPC_URL").ok().filter(|s| !s.is_empty());
        }

        opts
    }

    fn arg(&self, index: usize, name: &str) -> anyhow::Result<&str> {
        self.rest
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("missing <{}>\n\nUsage: simplebank {} ...", name, self.command.as_deref().unwrap_or("")))
    }
}

fn print_usage() {
    println!(
        r#"simplebank - SimpleBank ledger client

USAGE:
    simplebank [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    session                 Connect and show the session
    balance                 Show the bank balance of the connected account
    deposit <amount>        Deposit ether into the bank
    withdraw <amount>       Withdraw ether from the bank
    transfer <amount> <to>  Move bank balance to another account

OPTIONS:
    -r, --rpc <url>         JSON-RPC endpoint (SIMPLEBANK_RPC_URL, default {})
    --json                  Output raw JSON
    --pretty                Pretty-print JSON
    -h, --help              Show this help
    -V, --version           Show version

ENVIRONMENT:
    SIMPLEBANK_CONTRACT     Bank contract address
    SIMPLEBANK_CHAIN_ID     Required network, hex or decimal (default 0xaa36a7)
    SIMPLEBANK_POLL_MS      Receipt poll interval in milliseconds
    SIMPLEBANK_LOG_FORMAT   compact, pretty or json log lines on stderr
    RUST_LOG                Log filter (default warn,simplebank=info)"#,
        DEFAULT_RPC_URL
    );
}

async fn run(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let config = BankConfig::from_env()?;
    let url = opts.rpc_url.as_deref().unwrap_or(DEFAULT_RPC_URL);
    debug!(url, contract = %config.contract(), chain = %config.required_chain(), "using node");

    let wallet = Eip1193Wallet::new(HttpTransport::new(url), config.contract())
        .with_confirmation(config.confirmation_poll, config.confirmation_timeout);
    let client = BankClient::new(Rc::new(wallet), config);
    execute(&client, opts).await
}

async fn execute(client: &BankClient, opts: &ParsedArgs) -> anyhow::Result<Value> {
    let session = client.connect().await?;
    let receipt = match opts.command.as_deref() {
        Some("session") => return Ok(serde_json::to_value(&session)?),
        Some("balance") => {
            // WrongNetwork and QueryFailed both end up here
            let balance = client.refresh_balance().await?;
            return Ok(serde_json::to_value(balance.view())?);
        }
        Some("deposit") => client.submit_deposit(opts.arg(0, "amount")?).await?,
        Some("withdraw") => client.submit_withdraw(opts.arg(0, "amount")?).await?,
        Some("transfer") => client.submit_transfer(opts.arg(0, "amount")?, opts.arg(1, "to")?).await?,
        Some(cmd) => bail!("Unknown command: {}", cmd),
        None => bail!("no command"),
    };

    let mut output = serde_json::to_value(&receipt)?;
    output["balance"] = serde_json::to_value(client.current_balance().view())?;
    Ok(output)
}
