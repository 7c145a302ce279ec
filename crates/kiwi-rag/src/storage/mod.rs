//! Index persistence: bincode snapshot written atomically via a sibling
//! temp file and rename.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::RagError;
use crate::index::VectorIndex;

pub fn save_index(index: &VectorIndex, path: &Path) -> Result<(), RagError> {
    let bytes = bincode::serialize(index)
        .map_err(|e| RagError::Persistence(format!("serialize index: {}", e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| RagError::Persistence(format!("create {}: {}", parent.display(), e)))?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)
        .map_err(|e| RagError::Persistence(format!("write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| RagError::Persistence(format!("rename {}: {}", path.display(), e)))?;

    info!(path = %path.display(), bytes = bytes.len(), "index saved");
    Ok(())
}

pub fn load_index(path: &Path) -> Result<VectorIndex, RagError> {
    let bytes = fs::read(path)
        .map_err(|e| RagError::Persistence(format!("read {}: {}", path.display(), e)))?;
    let index: VectorIndex = bincode::deserialize(&bytes)
        .map_err(|e| RagError::Persistence(format!("decode {}: {}", path.display(), e)))?;

    info!(path = %path.display(), chunks = index.len(), "index loaded");
    Ok(index)
}
