//! Session controller: owns the rendering surface and the attached model,
//! runs the load protocol, and forwards user input.
//!
//! Phases:
//! - `Created` until `initialize` is called,
//! - `Initializing` while the backend builds the surface,
//! - `Ready` once the surface exists (loads run only in this phase),
//! - `SurfaceFailed` if the surface could not be built,
//! - `TornDown` after `teardown`.
//!
//! Every public operation does its synchronous work immediately. Operations
//! that wait on a collaborator return a [`LoadFuture`] that finishes the work;
//! the host spawns it on its local executor. A load whose token was
//! superseded by the time its future resumes releases what it obtained and
//! leaves the session untouched.
//!
//! Collaborator calls happen while the session's interior state is borrowed,
//! so collaborators must not call back into the session synchronously.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, ModelHandle, ModelLoader, RenderSurface};
use crate::capabilities::Capabilities;
use crate::catalog::{Catalog, ModelId};
use crate::config::Config;
use crate::error::{BackendError, SessionError};
use crate::events::{EventLog, SessionEvent};
use crate::layout::{fit_to_surface, Point};
use crate::loader::LoaderCache;
use crate::pointer::{GazeCoalescer, PointerButton, TapDetector};
use crate::state::SessionState;
use crate::token::{LoadToken, TokenIssuer};

/// Completion of an asynchronous session operation.
pub type LoadFuture = LocalBoxFuture<'static, ()>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Created,
    Initializing,
    Ready,
    SurfaceFailed,
    TornDown,
}

struct Attached<H> {
    model: ModelId,
    handle: H,
}

struct Inner<B: Backend> {
    phase: Phase,
    surface: Option<B::Surface>,
    attached: Option<Attached<B::Handle>>,
    tokens: TokenIssuer,
    state: SessionState,
    gaze: GazeCoalescer,
    taps: TapDetector,
    events: EventLog,
}

impl<B: Backend> Inner<B> {
    /// Detach the current model from the surface and destroy it.
    fn release_attached(&mut self) {
        if let Some(Attached { model, handle }) = self.attached.take() {
            if let Some(surface) = self.surface.as_mut() {
                surface.detach(&handle);
            }
            handle.destroy();
            log::debug!("released model '{model}'");
            self.events.push(SessionEvent::ModelReleased { model });
        }
    }

    fn fail_load(&mut self, model: &ModelId, err: SessionError) {
        let message = err.to_string();
        log::warn!("{message}");
        self.state.expressions.clear();
        self.state.motions.clear();
        self.state.last_error = Some(message.clone());
        self.state.is_loading = false;
        self.events.push(SessionEvent::ModelLoadFailed {
            model: model.clone(),
            message,
        });
    }

    /// Cancel outstanding work and release everything held. Idempotent.
    fn shutdown(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        self.tokens.invalidate();
        self.release_attached();
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
        self.gaze.clear();
        self.taps.clear();
        self.phase = Phase::TornDown;
        self.events.push(SessionEvent::TornDown);
    }
}

impl<B: Backend> Drop for Inner<B> {
    fn drop(&mut self) {
        if self.phase != Phase::TornDown {
            log::warn!("session dropped without teardown; releasing resources");
            self.shutdown();
        }
    }
}

/// Handle to one mounted avatar view. Clones share the same session.
pub struct SessionController<B: Backend> {
    backend: Rc<B>,
    loader: LoaderCache<B::Loader>,
    config: Rc<Config>,
    catalog: Rc<Catalog>,
    inner: Rc<RefCell<Inner<B>>>,
}

impl<B: Backend> Clone for SessionController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            loader: self.loader.clone(),
            config: Rc::clone(&self.config),
            catalog: Rc::clone(&self.catalog),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for SessionController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SessionController")
            .field("phase", &inner.phase)
            .field("state", &inner.state)
            .field("loader", &self.loader)
            .finish()
    }
}

impl<B: Backend> SessionController<B> {
    /// Create a session. `loader` may be shared with other sessions so the
    /// model runtime is brought up only once.
    pub fn new(backend: B, loader: LoaderCache<B::Loader>, config: Config) -> Self {
        let catalog = config.catalog();
        let inner = Inner {
            phase: Phase::Created,
            surface: None,
            attached: None,
            tokens: TokenIssuer::new(),
            state: SessionState::new(ModelId::new(config.default_model.clone())),
            gaze: GazeCoalescer::new(),
            taps: TapDetector::new(config.drag_tolerance_px),
            events: EventLog::new(config.max_events),
        };
        Self {
            backend: Rc::new(backend),
            loader,
            config: Rc::new(config),
            catalog: Rc::new(catalog),
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    pub fn state(&self) -> SessionState {
        self.inner.borrow().state.clone()
    }

    /// Model currently attached to the surface, if any.
    pub fn attached_model(&self) -> Option<ModelId> {
        self.inner
            .borrow()
            .attached
            .as_ref()
            .map(|a| a.model.clone())
    }

    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.inner.borrow_mut().events.drain()
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.inner.borrow().phase == Phase::TornDown {
            log::warn!("operation on a torn-down session");
            return Err(SessionError::TornDown);
        }
        Ok(())
    }

    /// Create the rendering surface inside `container`, then load the
    /// selected model.
    ///
    /// Surface failures are recorded in the state, not returned. If the
    /// session is torn down before the surface arrives, the surface is
    /// destroyed on arrival.
    pub fn initialize(&self, container: B::Container) -> Result<LoadFuture, SessionError> {
        {
            let mut inner = self.inner.borrow_mut();
            match inner.phase {
                Phase::Created => inner.phase = Phase::Initializing,
                Phase::TornDown => return Err(SessionError::TornDown),
                _ => return Err(SessionError::AlreadyInitialized),
            }
        }
        log::debug!("creating rendering surface");
        let pending = self.backend.create_surface(container, &self.config.surface);
        let this = self.clone();
        Ok(async move {
            let created = pending.await;
            if let Some(model) = this.finish_surface(created) {
                this.begin_load(model).await;
            }
        }
        .boxed_local())
    }

    /// Install a freshly created surface. Returns the model to load next.
    fn finish_surface(&self, created: Result<B::Surface, BackendError>) -> Option<ModelId> {
        let mut inner = self.inner.borrow_mut();
        if inner.phase == Phase::TornDown {
            if let Ok(surface) = created {
                log::debug!("surface arrived after teardown; destroying it");
                surface.destroy();
            }
            return None;
        }
        match created {
            Ok(surface) => {
                let size = surface.dimensions();
                log::debug!("surface ready ({}x{})", size.width, size.height);
                inner.surface = Some(surface);
                inner.phase = Phase::Ready;
                inner.events.push(SessionEvent::SurfaceReady {
                    width: size.width,
                    height: size.height,
                });
                Some(inner.state.selected_model.clone())
            }
            Err(e) => {
                let message = SessionError::SurfaceInit(e).to_string();
                log::warn!("{message}");
                inner.phase = Phase::SurfaceFailed;
                inner.state.last_error = Some(message.clone());
                inner.state.is_loading = false;
                inner.events.push(SessionEvent::SurfaceFailed { message });
                None
            }
        }
    }

    /// Select a model and load it. Re-selecting the current model loads a
    /// fresh handle.
    ///
    /// Before the surface is ready the selection is only recorded; the
    /// initial load picks it up.
    pub fn select_model(&self, id: impl Into<ModelId>) -> Result<LoadFuture, SessionError> {
        self.ensure_live()?;
        let id = id.into();
        if !self.catalog.contains(&id) {
            log::warn!("model '{id}' is not in the catalog");
        }
        {
            let mut inner = self.inner.borrow_mut();
            inner.state.selected_model = id.clone();
            if inner.phase != Phase::Ready {
                log::debug!("surface not ready; deferring load of '{id}'");
                return Ok(future::ready(()).boxed_local());
            }
        }
        Ok(self.begin_load(id))
    }

    /// Load protocol, synchronous part: reset loading state, supersede any
    /// outstanding load, release the attached model, start resolving.
    fn begin_load(&self, model: ModelId) -> LoadFuture {
        let token = {
            let mut inner = self.inner.borrow_mut();
            inner.state.is_loading = true;
            inner.state.last_error = None;
            let token = inner.tokens.issue();
            inner.release_attached();
            token
        };

        let manifest = self.catalog.manifest_path(&model);
        log::debug!(
            "loading '{model}' from {manifest} (generation {})",
            token.generation()
        );
        let options = self.config.load.clone();
        let backend = Rc::clone(&self.backend);
        let runtime = self.loader.get_or_init(move || backend.load_runtime());
        let this = self.clone();
        async move {
            let result = match runtime.await {
                Ok(loader) => loader.resolve(&manifest, &options).await,
                Err(e) => Err(e),
            };
            this.finish_load(token, model, result);
        }
        .boxed_local()
    }

    /// Load protocol, resumption: discard superseded results, otherwise
    /// place and attach the model and publish its capabilities.
    fn finish_load(
        &self,
        token: LoadToken,
        model: ModelId,
        result: Result<B::Handle, BackendError>,
    ) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;

        if !inner.tokens.is_current(token) {
            if let Ok(handle) = result {
                handle.destroy();
            }
            log::debug!("load of '{model}' superseded; result discarded");
            inner.events.push(SessionEvent::LoadSuperseded { model });
            return;
        }
        inner.tokens.settle(token);

        let mut handle = match result {
            Ok(handle) => handle,
            Err(reason) => {
                inner.fail_load(&model, SessionError::ModelLoad { model: model.clone(), reason });
                return;
            }
        };

        let Some(surface) = inner.surface.as_mut() else {
            handle.destroy();
            return;
        };

        let Some(placement) =
            fit_to_surface(surface.dimensions(), handle.dimensions(), self.config.fit_margin)
        else {
            handle.destroy();
            inner.fail_load(&model, SessionError::InvalidLayout { model: model.clone() });
            return;
        };

        handle.set_scale(placement.scale);
        handle.set_position(placement.position);
        surface.attach(&handle);
        let caps = Capabilities::of(&handle);

        log::info!(
            "loaded '{model}': {} expressions, {} motions",
            caps.expressions.len(),
            caps.motions.len()
        );
        inner.state.expressions = caps.expressions;
        inner.state.motions = caps.motions;
        inner.state.is_loading = false;
        inner.events.push(SessionEvent::ModelLoaded {
            model: model.clone(),
            scale: placement.scale,
            x: placement.position.x,
            y: placement.position.y,
        });
        inner.attached = Some(Attached { model, handle });
    }

    /// Forward an expression to the attached model. No-op without one.
    pub fn trigger_expression(&self, name: &str) -> Result<(), SessionError> {
        self.ensure_live()?;
        if let Some(a) = self.inner.borrow_mut().attached.as_mut() {
            a.handle.trigger_expression(name);
        }
        Ok(())
    }

    /// Forward a motion to the attached model. No-op without one.
    pub fn trigger_motion(&self, group: &str, index: usize) -> Result<(), SessionError> {
        self.ensure_live()?;
        if let Some(a) = self.inner.borrow_mut().attached.as_mut() {
            a.handle.trigger_motion(group, index);
        }
        Ok(())
    }

    fn to_local(inner: &Inner<B>, page: Point) -> Option<Point> {
        if inner.attached.is_none() {
            return None;
        }
        let surface = inner.surface.as_ref()?;
        Some(page.relative_to(surface.page_origin()))
    }

    /// Queue a gaze target. Returns `true` when the host must schedule a
    /// call to [`frame`](Self::frame) before the next paint.
    pub fn pointer_move(&self, page: Point) -> bool {
        let mut inner = self.inner.borrow_mut();
        match Self::to_local(&inner, page) {
            Some(local) => inner.gaze.push(local),
            None => false,
        }
    }

    /// Frame boundary: forward the most recent gaze target, if any.
    pub fn frame(&self) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if let Some(target) = inner.gaze.take() {
            if let Some(a) = inner.attached.as_mut() {
                a.handle.focus(target.x, target.y);
            }
        }
    }

    pub fn pointer_down(&self, button: PointerButton, page: Point) {
        let mut inner = self.inner.borrow_mut();
        if let Some(local) = Self::to_local(&inner, page) {
            inner.taps.press(button, local);
        }
    }

    /// Completes a click: a primary press released in place taps the model.
    pub fn pointer_up(&self, button: PointerButton, page: Point) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let Some(local) = Self::to_local(inner, page) else {
            inner.taps.clear();
            return;
        };
        if let Some(at) = inner.taps.release(button, local) {
            if let Some(a) = inner.attached.as_mut() {
                a.handle.tap(at.x, at.y);
            }
        }
    }

    /// Cancel outstanding loads and release the model and surface. Calling
    /// it again is a no-op.
    pub fn teardown(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.phase == Phase::TornDown {
            return;
        }
        log::debug!("tearing down session");
        inner.shutdown();
    }
}
