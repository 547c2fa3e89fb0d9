//! Runtime settings of a loaded model: the expression list and motion groups
//! named by its manifest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One expression entry. Cubism 3+ manifests spell the name field `Name`,
/// Cubism 2 manifests spell it `name`; both are kept so the extractor can
/// prefer the canonical spelling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionEntry {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub alt_name: Option<String>,
    #[serde(
        rename = "File",
        alias = "file",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<String>,
}

impl ExpressionEntry {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Canonical name if present, otherwise the alternate spelling.
    pub fn resolved_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.alt_name.as_deref())
    }
}

/// One motion inside a group. Only the file reference is interpreted here;
/// playback parameters belong to the runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionDefinition {
    #[serde(
        rename = "File",
        alias = "file",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<String>,
}

/// Settings view exposed by a model handle. Group order is the order the
/// settings data lists them in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(
        alias = "Expressions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expressions: Option<Vec<ExpressionEntry>>,
    #[serde(alias = "Motions", default, skip_serializing_if = "Option::is_none")]
    pub motions: Option<IndexMap<String, Vec<MotionDefinition>>>,
}

impl ModelSettings {
    /// Parse settings out of a model manifest file.
    ///
    /// Accepts Cubism 3+ manifests (`FileReferences.Expressions` /
    /// `FileReferences.Motions`) and Cubism 2 manifests (top-level
    /// `expressions` / `motions`).
    pub fn from_manifest_json(s: &str) -> Result<Self, serde_json::Error> {
        let root: serde_json::Value = serde_json::from_str(s)?;
        match root.get("FileReferences") {
            Some(refs) if refs.is_object() => serde_json::from_value(refs.clone()),
            _ => serde_json::from_value(root),
        }
    }
}
