//! `sd-server`: hosts one shared drawing over TCP.

use clap::Parser;
use sd_editor::LogUndoPolicy;
use sd_server::ServerConfig;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "sd-server")]
#[command(about = "Authoritative server for a shared vector drawing")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:54181")]
    listen: SocketAddr,

    /// What happens to undone steps when a new edit arrives (gnu or microsoft)
    #[arg(short, long, default_value = "gnu")]
    policy: LogUndoPolicy,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        listen: args.listen,
        policy: args.policy,
    };

    tokio::select! {
        result = sd_server::run(config) => result?,
        _ = tokio::signal::ctrl_c() => log::info!("shutting down"),
    }
    Ok(())
}
