//! Node identity keys.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use libp2p::identity::Keypair;
use tracing::info;

/// Load the keypair at `path`, generating and saving a new Ed25519 one if
/// the file does not exist yet
pub fn load_or_generate_keypair<P: AsRef<Path,>,>(path: P,) -> Result<Keypair,> {
    let path = path.as_ref();

    if path.exists() {
        let bytes = fs::read(path,)
            .with_context(|| format!("failed to read keypair from {}", path.display()))?;
        let keypair = Keypair::from_protobuf_encoding(&bytes,)
            .with_context(|| format!("invalid keypair in {}", path.display()))?;
        return Ok(keypair,);
    }

    let keypair = Keypair::generate_ed25519();

    if let Some(parent,) = path.parent() {
        fs::create_dir_all(parent,)?;
    }
    let bytes = keypair.to_protobuf_encoding()?;
    fs::write(path, &bytes,)
        .with_context(|| format!("failed to write keypair to {}", path.display()))?;
    info!("Generated new node identity at {}", path.display());

    Ok(keypair,)
}
