//! Engine config loading: optional local JSON file → validated `EngineConfig`.

use std::fs;
use std::path::Path;

use pmq_core::variables::EngineConfig;

use crate::{looks_like_url_strict, IoError, IoResult};

/// Parse config bytes and run domain validation.
pub fn parse_config(bytes: &[u8]) -> IoResult<EngineConfig> {
    let cfg: EngineConfig = serde_json::from_slice(bytes)?;
    cfg.validate_domains()
        .map_err(|e| IoError::Invalid(format!("config: {e}")))?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> IoResult<EngineConfig> {
    let shown = path.to_string_lossy();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Path(format!("non-local path refused: {shown}")));
    }
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    parse_config(&bytes)
}
