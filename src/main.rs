use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use dust_cleaner::cleaner::{CleanOutcome, CleanRequest, DustCleaner};
use dust_cleaner::config::{CoinProfile, RpcEndpoint};
use dust_cleaner::report::{dump_csv, SelectionReport};
use dust_cleaner::rpc::RpcClient;
use dust_cleaner::selection::DustSelector;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Joins 'dust' received payments into a manageable new bigger payment to the
/// given address, with minimal transaction fee.
#[derive(Parser, Debug)]
#[clap(version)]
pub struct Cli {
    /// The address to send the aggregated payments to
    #[clap(value_parser)]
    address: String,
    /// The maximum transaction fee allowed. Creates a transaction with no fee if omitted
    #[clap(short = 'f', long, value_parser = parse_max_fee, default_value = "0")]
    max_fee: Decimal,
    /// Address not to be included in the new transaction, can be repeated. ADDRESS is always ignored
    #[clap(short, long, value_parser)]
    ignore: Vec<String>,
    /// The wallet RPC host:port. Defaults to localhost and the coin's RPC port
    #[clap(short = 'o', long, value_parser)]
    rpc_url: Option<String>,
    /// The RPC username. Read from the wallet config file if either user or password is omitted
    #[clap(short = 'u', long, value_parser)]
    rpc_user: Option<String>,
    /// The RPC password. Read from the wallet config file if either user or password is omitted
    #[clap(short = 'p', long, value_parser)]
    rpc_password: Option<String>,
    /// Use HTTPS instead of HTTP for the RPC calls
    #[clap(short = 's', long, value_parser)]
    https: bool,
    /// Send the transaction to the network. Only reports what would be collected if omitted
    #[clap(short = 'g', long, value_parser)]
    go: bool,
    /// path to a YAML coin profile (coin name, code, RPC port, fee policy)
    #[clap(long, value_parser)]
    profile: Option<PathBuf>,
    /// path to write the accepted and rejected outputs as CSV
    #[clap(long, value_parser)]
    report_path: Option<PathBuf>,
    /// Log RPC calls and selection progress
    #[clap(short, long, value_parser)]
    verbose: bool,
}

fn parse_max_fee(value: &str) -> anyhow::Result<Decimal> {
    let fee = Decimal::from_str(value).with_context(|| format!("`{value}` is not an amount"))?;
    if fee.is_sign_negative() {
        return Err(anyhow!("the fee can't be negative"));
    }
    Ok(fee)
}

#[tokio::main]
async fn main() {
    if let Err(err) = _main().await {
        eprintln!("{err:#}");
        eprintln!("Execution aborted.");
        std::process::exit(1);
    }
}

async fn _main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Start logging setup block
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = Targets::new()
        .with_target("reqwest", Level::WARN)
        .with_target("hyper", Level::WARN)
        .with_default(level);
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    let Cli {
        address,
        max_fee,
        ignore,
        rpc_url,
        rpc_user,
        rpc_password,
        https,
        go,
        profile,
        report_path,
        verbose: _,
    } = cli;

    let profile = CoinProfile::load(profile.as_deref())?;
    let endpoint = RpcEndpoint::resolve(
        &profile,
        rpc_url,
        rpc_user,
        rpc_password,
        https,
        &profile.wallet_conf_path()?,
    )?;
    tracing::info!("Wallet RPC at {}", endpoint.url());

    let cleaner = DustCleaner::new(
        RpcClient::new(endpoint)?,
        DustSelector::new(profile.fee_policy.clone()),
        profile.coin_name.clone(),
    );
    let request = CleanRequest {
        pay_to: address,
        max_fee,
        ignore: ignore.into_iter().unique().collect(),
        commit: go,
    };

    let selection = cleaner.select(&request).await?;
    println!();
    println!("{}", SelectionReport::new(&selection, &profile.coin_code));
    println!();

    if let Some(path) = report_path {
        dump_csv(&selection, &path)?;
        tracing::info!("Report written to {:?}", path);
    }

    match cleaner.collect(&request, &selection).await? {
        CleanOutcome::DryRun => {
            println!("Test mode. Run with --go to actually collect the dust payments.");
        }
        CleanOutcome::NothingToCollect => {
            println!("Nothing to collect.");
        }
        CleanOutcome::Broadcast { txid } => {
            println!("Dust collected in transaction {txid}.");
        }
    }

    Ok(())
}
