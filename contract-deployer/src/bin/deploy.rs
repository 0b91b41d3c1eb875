use clap::Parser;
use contract_deployer::{deploy, Config, DeployError, RpcNetwork};
use dotenv::dotenv;
use log::debug;
use std::{io, path::PathBuf, process, time::Duration};

// CLI argument parsing
#[derive(Parser, Debug)]
#[command(author, version, about = "Deploy precompiled contract bytecode with a locally signed transaction", long_about = None)]
struct Args {
    /// Env file to load before reading configuration (a missing file is fine)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Pin the sender nonce instead of asking the node (decimal, overrides NONCE)
    #[arg(long)]
    nonce: Option<u64>,

    /// Seconds to wait for the deployment to be mined
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    receipt_timeout: u64,

    /// Milliseconds between receipt polls
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), DeployError> {
    let loaded = match &args.env_file {
        Some(path) => dotenv::from_path(path).map(|_| path.clone()),
        None => dotenv(),
    };
    match loaded {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No env file loaded: {}", e),
    }

    let mut config = Config::from_env()?
        .with_receipt_timeout(Duration::from_secs(args.receipt_timeout))
        .with_poll_interval(Duration::from_millis(args.poll_interval));
    if let Some(nonce) = args.nonce {
        config = config.with_nonce(nonce);
    }
    debug!("Loaded {:?}", config);

    let network = RpcNetwork::connect(&config.rpc_url)?;
    let stdout = io::stdout();
    deploy(&network, &config, &mut stdout.lock()).await?;
    Ok(())
}
