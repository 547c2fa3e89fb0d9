//! Read-only snapshot handed to presentation code.

use serde::{Deserialize, Serialize};

use crate::capabilities::MotionEntry;
use crate::catalog::ModelId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub selected_model: ModelId,
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub expressions: Vec<String>,
    pub motions: Vec<MotionEntry>,
}

impl SessionState {
    /// Initial state: loading until the first load protocol run settles.
    pub fn new(selected_model: ModelId) -> Self {
        Self {
            selected_model,
            is_loading: true,
            last_error: None,
            expressions: Vec::new(),
            motions: Vec::new(),
        }
    }
}
