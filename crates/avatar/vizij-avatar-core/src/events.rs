//! Discrete session events, drained by hosts for diagnostics.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::catalog::ModelId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    SurfaceReady { width: f32, height: f32 },
    SurfaceFailed { message: String },
    ModelLoaded { model: ModelId, scale: f32, x: f32, y: f32 },
    ModelLoadFailed { model: ModelId, message: String },
    /// A load finished after a newer one started (or after teardown); its
    /// result was discarded.
    LoadSuperseded { model: ModelId },
    ModelReleased { model: ModelId },
    TornDown,
}

/// Bounded FIFO of events; the oldest entries are dropped once full.
#[derive(Debug)]
pub(crate) struct EventLog {
    events: VecDeque<SessionEvent>,
    cap: usize,
}

impl EventLog {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            events: VecDeque::new(),
            cap,
        }
    }

    pub(crate) fn push(&mut self, ev: SessionEvent) {
        if self.cap == 0 {
            return;
        }
        while self.events.len() >= self.cap {
            self.events.pop_front();
        }
        self.events.push_back(ev);
    }

    pub(crate) fn drain(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }
}
