//! Static registry of the bundled character models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Names of the bundled models, in display order.
pub const MODEL_NAMES: [&str; 8] = [
    "Haru", "Hiyori", "Mao", "Mark", "Natori", "Rice", "Wanko", "Ren",
];

/// Identifier of a model as the user selects it.
///
/// Any string is representable so that a host can ask for a model the
/// catalog does not list; the loader is the one that rejects it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ordered, closed set of model identifiers plus the path convention that
/// locates each model's manifest under a static asset root.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<ModelId>,
    asset_root: String,
    manifest_extension: String,
}

impl Catalog {
    pub fn new(asset_root: impl Into<String>, manifest_extension: impl Into<String>) -> Self {
        Self {
            entries: MODEL_NAMES.iter().map(|n| ModelId::from(*n)).collect(),
            asset_root: asset_root.into(),
            manifest_extension: manifest_extension.into(),
        }
    }

    pub fn entries(&self) -> &[ModelId] {
        &self.entries
    }

    pub fn contains(&self, id: &ModelId) -> bool {
        self.entries.iter().any(|e| e == id)
    }

    /// `{root}/{id}/{id}.{ext}`, or `{id}/{id}.{ext}` when the root is empty.
    pub fn manifest_path(&self, id: &ModelId) -> String {
        let root = self.asset_root.trim_end_matches('/');
        let ext = self.manifest_extension.trim_start_matches('.');
        if root.is_empty() {
            format!("{id}/{id}.{ext}")
        } else {
            format!("{root}/{id}/{id}.{ext}")
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new("models", "model3.json")
    }
}
