use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    models: HashMap<String, ModelEntry>,
}

/// A fixture model: its manifest file plus the unscaled size a runtime
/// would report once the model is loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub manifest: String,
    pub width: f32,
    pub height: f32,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod models {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.models.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn entry(name: &str) -> Result<ModelEntry> {
        lookup(&MANIFEST.models, "model", name).cloned()
    }

    /// Raw manifest text, key order intact.
    pub fn manifest_json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.models, "model", name)?;
        read_to_string(&entry.manifest)
    }
}
