//! Process-wide engine configuration.
//!
//! Holds the limits and compatibility switches consulted by the path codec and the
//! find-operation parser. The active config lives in a global registry so the pure
//! functions of this crate do not need to thread it through every call. Until a
//! caller sets it (or calls [`crate::init`]) the defaults apply: no path depth
//! limit and priority combinators. Nothing here reads the environment on its own.

use crate::errors::DocError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// How a find operation carrying more than one of `$and`/`$nor`/`$or` is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinatorPolicy {
    /// Honor one combinator in the order `$and` > `$nor` > `$or`; ignore the rest.
    #[default]
    Priority,
    /// Reject coexisting combinators and combinators mixed with field paths.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Paths with more attributes fail to parse. `None` means unlimited.
    pub max_path_depth: Option<usize>,
    pub combinators: CombinatorPolicy,
}

static CONFIG: LazyLock<RwLock<EngineConfig>> =
    LazyLock::new(|| RwLock::new(EngineConfig::default()));

/// Snapshot of the active configuration.
pub fn current() -> EngineConfig {
    CONFIG.read().clone()
}

/// Replace the active configuration.
pub fn set(cfg: EngineConfig) {
    log::debug!("engine config replaced: {cfg:?}");
    *CONFIG.write() = cfg;
}

/// Restore the built-in defaults.
pub fn reset() {
    set(EngineConfig::default());
}

pub(crate) fn max_path_depth() -> Option<usize> {
    CONFIG.read().max_path_depth
}

pub(crate) fn combinator_policy() -> CombinatorPolicy {
    CONFIG.read().combinators
}

/// # Errors
/// Returns an error if the TOML is malformed or holds unknown values.
pub fn from_toml_str(s: &str) -> Result<EngineConfig, DocError> {
    toml::from_str::<EngineConfig>(s).map_err(|e| DocError::Config(e.to_string()))
}

/// Read a TOML file and make it the active configuration.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<EngineConfig, DocError> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| DocError::Config(format!("{}: {e}", path.display())))?;
    let cfg = from_toml_str(&s)?;
    set(cfg.clone());
    Ok(cfg)
}

/// Apply overrides from environment variables if present. Only called explicitly,
/// usually through [`crate::init`]:
/// - DOCOPS_MAX_PATH_DEPTH
/// - DOCOPS_COMBINATORS (`priority` | `strict`)
pub fn configure_from_env() {
    let mut cfg = current();
    if let Some(depth) =
        std::env::var("DOCOPS_MAX_PATH_DEPTH").ok().and_then(|s| s.parse::<usize>().ok())
    {
        cfg.max_path_depth = Some(depth);
    }
    if let Ok(s) = std::env::var("DOCOPS_COMBINATORS") {
        match s.to_ascii_lowercase().as_str() {
            "strict" => cfg.combinators = CombinatorPolicy::Strict,
            "priority" => cfg.combinators = CombinatorPolicy::Priority,
            other => log::warn!("ignoring unknown DOCOPS_COMBINATORS value: {other}"),
        }
    }
    set(cfg);
}
