//! Vizij Avatar Core (engine-agnostic)
//!
//! Lifecycle management for an interactive 2D character view: one rendering
//! surface per mounted view, at most one attached model at a time, a
//! cancellable load protocol for switching models, capability extraction
//! (expressions and motion groups), and pointer wiring for gaze and taps.
//!
//! Rendering and the model runtime are collaborators behind the traits in
//! [`backend`]; adapters (wasm) implement them for a concrete engine.

pub mod backend;
pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod loader;
pub mod pointer;
pub mod session;
pub mod settings;
pub mod state;
pub mod token;

// Re-exports for consumers (adapters)
pub use backend::{Backend, ModelHandle, ModelLoader, RenderSurface};
pub use capabilities::{extract_capabilities, Capabilities, MotionEntry};
pub use catalog::{Catalog, ModelId, MODEL_NAMES};
pub use config::{Config, LoadOptions, SurfaceOptions};
pub use error::{BackendError, SessionError};
pub use events::SessionEvent;
pub use layout::{fit_to_surface, Placement, Point, Size};
pub use loader::LoaderCache;
pub use pointer::PointerButton;
pub use session::{LoadFuture, Phase, SessionController};
pub use settings::{ExpressionEntry, ModelSettings, MotionDefinition};
pub use state::SessionState;
pub use token::{LoadToken, TokenIssuer};
