//! peersub-node: run a peersub node, or use one for a single topic.

mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use peersub::{NodeHandle, PeerNode, PubSubError, SubscribeOptions};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "peersub-node", version, about = "Topic publish/subscribe over libp2p")]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/peersub/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listen on this port instead of the configured range
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Extra bootstrap peer multiaddresses (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    bootstrap: Vec<String>,

    /// Run without the messaging engine
    #[arg(long, global = true)]
    no_pubsub: bool,

    /// Disable local network discovery
    #[arg(long, global = true)]
    no_mdns: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the node until interrupted (default)
    Run,
    /// Print every message published to a topic
    Sub {
        topic: String,
        /// Look for other subscribers of the topic and connect to them
        #[arg(long)]
        discover: bool,
    },
    /// Publish one message to a topic
    Pub {
        topic: String,
        data: String,
        /// Give the mesh this long to form before publishing
        #[arg(long, default_value_t = 2)]
        wait_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_with_level(logger::level_for_verbosity(args.verbose));

    let config = config::Config::from_config(args.config.as_ref())?;
    info!("{config}");
    let mut node_config = config.node_config();
    if let Some(port) = args.port {
        node_config = node_config.with_port_range((port, port));
    }
    node_config.bootstrap_peers.extend(args.bootstrap.iter().cloned());
    if args.no_pubsub {
        node_config = node_config.with_pubsub(false);
    }
    if args.no_mdns {
        node_config = node_config.with_mdns(false);
    }

    let node = PeerNode::with_config(node_config).await.context("starting node")?;
    let handle = node.spawn();
    info!(peer_id = %handle.peer_id(), "peersub node started");

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&handle).await,
        Command::Sub { topic, discover } => subscribe(&handle, &topic, discover).await,
        Command::Pub { topic, data, wait_secs } => {
            publish(&handle, &topic, data, Duration::from_secs(wait_secs)).await
        },
    };

    handle.shutdown();
    result
}

async fn run(handle: &NodeHandle) -> anyhow::Result<()> {
    for addr in handle.listen_addrs().await {
        info!("Reachable at {}/p2p/{}", addr, handle.peer_id());
    }
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

async fn subscribe(handle: &NodeHandle, topic: &str, discover: bool) -> anyhow::Result<()> {
    let pubsub = handle.pubsub();
    let mut subscription = pubsub
        .subscribe(topic, SubscribeOptions::new().discover(discover))
        .await
        .with_context(|| format!("subscribing to {topic}"))?;
    info!(topic, "waiting for messages, Ctrl+C to stop");

    let closer = subscription.closer();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            closer.close();
        }
    });

    loop {
        match subscription.next().await {
            Ok(message) => {
                println!(
                    "{} {} {}",
                    message.from(),
                    hex::encode(message.seq()),
                    String::from_utf8_lossy(message.data())
                );
            },
            Err(PubSubError::Closed) => return Ok(()),
            Err(e) => {
                warn!(error = %e, "subscription ended");
                return Err(e.into());
            },
        }
    }
}

async fn publish(handle: &NodeHandle, topic: &str, data: String, wait: Duration) -> anyhow::Result<()> {
    let pubsub = handle.pubsub();

    // Subscribing joins the topic mesh, so the message has somewhere to go
    let subscription = pubsub.subscribe(topic, SubscribeOptions::new().discover(true)).await?;
    tokio::time::sleep(wait).await;

    pubsub.publish(topic, data).await.with_context(|| format!("publishing to {topic}"))?;
    info!(topic, peers = pubsub.peers(Default::default()).await?.len(), "published");

    subscription.close();
    Ok(())
}
