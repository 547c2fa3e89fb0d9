//! Capability extraction: the expression names and motion entries a loaded
//! model offers, in display order.

use serde::{Deserialize, Serialize};

use crate::backend::ModelHandle;
use crate::settings::ModelSettings;

/// One playable motion. `index` is 0-based within its group; the display
/// name numbers motions from 1.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionEntry {
    pub group: String,
    pub index: usize,
    pub display_name: String,
}

impl MotionEntry {
    pub fn new(group: &str, index: usize) -> Self {
        Self {
            group: group.to_string(),
            index,
            display_name: format!("{} #{}", group, index + 1),
        }
    }
}

/// Expression and motion lists derived from one model load.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub expressions: Vec<String>,
    pub motions: Vec<MotionEntry>,
}

/// Build the display lists from a model's settings.
///
/// Expression entries without either name spelling are skipped; duplicates
/// pass through. Missing sections produce empty lists.
pub fn extract_capabilities(settings: &ModelSettings) -> Capabilities {
    let expressions = settings
        .expressions
        .iter()
        .flatten()
        .filter_map(|e| e.resolved_name().map(str::to_string))
        .collect();

    let mut motions = Vec::new();
    for (group, defs) in settings.motions.iter().flatten() {
        for index in 0..defs.len() {
            motions.push(MotionEntry::new(group, index));
        }
    }

    Capabilities {
        expressions,
        motions,
    }
}

impl Capabilities {
    pub fn of<H: ModelHandle>(handle: &H) -> Self {
        extract_capabilities(&handle.settings())
    }
}
