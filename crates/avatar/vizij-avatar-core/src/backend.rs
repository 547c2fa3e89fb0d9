//! Collaborator traits: the narrow capability surface the session needs from
//! a rendering engine and a model runtime.
//!
//! Futures are `'static` and not `Send`; everything runs on one thread and
//! suspends only while a collaborator is working.

use futures::future::LocalBoxFuture;

use crate::config::{LoadOptions, SurfaceOptions};
use crate::error::BackendError;
use crate::layout::{Point, Size};
use crate::settings::ModelSettings;

/// A rendering surface bound to a container element.
pub trait RenderSurface<N> {
    /// Current drawable size in surface pixels.
    fn dimensions(&self) -> Size;
    /// Page-space position of the surface's top-left corner.
    fn page_origin(&self) -> Point;
    fn attach(&mut self, node: &N);
    fn detach(&mut self, node: &N);
    /// Tear the surface down and free its GPU resources.
    fn destroy(self);
}

/// A live, controllable model instance.
pub trait ModelHandle {
    /// Unscaled model size.
    fn dimensions(&self) -> Size;
    fn set_scale(&mut self, scale: f32);
    fn set_position(&mut self, position: Point);
    fn settings(&self) -> ModelSettings;
    /// Point the model's gaze at surface-local coordinates.
    fn focus(&mut self, x: f32, y: f32);
    fn tap(&mut self, x: f32, y: f32);
    fn trigger_expression(&mut self, name: &str);
    fn trigger_motion(&mut self, group: &str, index: usize);
    fn destroy(self);
}

/// Resolves manifest paths into model handles.
pub trait ModelLoader {
    type Handle: ModelHandle;

    fn resolve(
        &self,
        manifest: &str,
        options: &LoadOptions,
    ) -> LocalBoxFuture<'static, Result<Self::Handle, BackendError>>;
}

/// Rendering engine plus model runtime wired into a session.
pub trait Backend: 'static {
    /// Host element the surface is created inside.
    type Container;
    type Handle: ModelHandle + 'static;
    type Surface: RenderSurface<Self::Handle> + 'static;
    type Loader: ModelLoader<Handle = Self::Handle> + 'static;

    fn create_surface(
        &self,
        container: Self::Container,
        options: &SurfaceOptions,
    ) -> LocalBoxFuture<'static, Result<Self::Surface, BackendError>>;

    /// Bring up the model runtime. Called at most once per `LoaderCache`
    /// unless a previous attempt failed.
    fn load_runtime(&self) -> LocalBoxFuture<'static, Result<Self::Loader, BackendError>>;
}
