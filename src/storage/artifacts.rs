//! Rendered artifacts
//!
//! Writes a finalized chain to disk: `<out>/<chain>/genesis.json` and one
//! `<out>/<chain>/nodes/<node>.sh` startup script per node.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::StorageError;
use crate::agent::NodeAgent;
use crate::genesis::Genesis;

/// File name of the genesis document
pub const GENESIS_FILE: &str = "genesis.json";

/// Directory holding node startup scripts
pub const NODES_DIR: &str = "nodes";

fn write_file(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| StorageError::from_io(path, e))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Write the genesis and the startup scripts of `agents`. Returns written paths.
pub fn write_chain_artifacts<'a, I>(
    out_dir: &Path,
    chain_name: &str,
    genesis: &Genesis,
    agents: I,
) -> Result<Vec<PathBuf>, StorageError>
where
    I: IntoIterator<Item = &'a NodeAgent>,
{
    let chain_dir = out_dir.join(chain_name);
    let mut written = Vec::new();

    let genesis_path = chain_dir.join(GENESIS_FILE);
    write_file(&genesis_path, &genesis.serialize()?)?;
    written.push(genesis_path);

    for agent in agents {
        let Some(script) = agent.startup_command() else {
            continue;
        };
        let path = chain_dir
            .join(NODES_DIR)
            .join(format!("{}.sh", agent.node_id()));
        write_file(&path, &script.to_string())?;
        written.push(path);
    }

    Ok(written)
}
