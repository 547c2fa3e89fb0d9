#![allow(dead_code)]
//! Scripted in-memory backend: records every collaborator call in a journal
//! and lets tests decide when surfaces and model loads resolve.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawnExt;

use vizij_avatar_core::{
    Backend, BackendError, Catalog, LoadFuture, LoadOptions, ModelHandle, ModelLoader,
    ModelSettings, Point, RenderSurface, Size, SurfaceOptions,
};
use vizij_test_fixtures::models;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    SurfaceCreated,
    SurfaceDestroyed,
    RuntimeRequested,
    HandleCreated { id: u32, model: String },
    HandleDestroyed(u32),
    Attach(u32),
    Detach(u32),
    Scale(u32, f32),
    Position(u32, Point),
    Focus(u32, f32, f32),
    Tap(u32, f32, f32),
    Expression(u32, String),
    Motion(u32, String, usize),
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Handles attached to the surface right now, replayed from the journal.
    pub fn attached(&self) -> Vec<u32> {
        let mut attached = Vec::new();
        for call in self.0.borrow().iter() {
            match call {
                Call::Attach(id) => attached.push(*id),
                Call::Detach(id) => attached.retain(|a| a != id),
                _ => {}
            }
        }
        attached
    }

    /// Handles created and not yet destroyed.
    pub fn live_handles(&self) -> Vec<u32> {
        let mut live = Vec::new();
        for call in self.0.borrow().iter() {
            match call {
                Call::HandleCreated { id, .. } => live.push(*id),
                Call::HandleDestroyed(id) => live.retain(|l| l != id),
                _ => {}
            }
        }
        live
    }

    pub fn handle_for(&self, model: &str) -> Vec<u32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::HandleCreated { id, model: m } if m == model => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn destroy_count(&self, id: u32) -> usize {
        self.count(|c| *c == Call::HandleDestroyed(id))
    }

    pub fn was_attached(&self, id: u32) -> bool {
        self.count(|c| *c == Call::Attach(id)) > 0
    }
}

/// Test stand-in for a DOM container element.
#[derive(Clone, Copy, Debug)]
pub struct TestContainer {
    pub size: Size,
    pub origin: Point,
}

impl TestContainer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            origin: Point::default(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.origin = Point::new(x, y);
        self
    }
}

pub enum SurfaceMode {
    Immediate,
    Fail(String),
    Deferred(oneshot::Receiver<()>),
}

/// Pending resolutions keyed by manifest path, released by the test.
#[derive(Clone, Default)]
pub struct Gates(Rc<RefCell<HashMap<String, VecDeque<oneshot::Receiver<Result<(), String>>>>>>);

pub struct Gate(oneshot::Sender<Result<(), String>>);

impl Gate {
    pub fn release(self) {
        let _ = self.0.send(Ok(()));
    }

    pub fn fail(self, message: &str) {
        let _ = self.0.send(Err(message.to_string()));
    }
}

impl Gates {
    /// Hold the next resolve of `model`'s manifest until the returned gate fires.
    pub fn hold(&self, model: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.0
            .borrow_mut()
            .entry(manifest_for(model))
            .or_default()
            .push_back(rx);
        Gate(tx)
    }

    fn take(&self, manifest: &str) -> Option<oneshot::Receiver<Result<(), String>>> {
        self.0.borrow_mut().get_mut(manifest)?.pop_front()
    }
}

pub fn manifest_for(model: &str) -> String {
    Catalog::default().manifest_path(&model.into())
}

pub struct ScriptedSurface {
    size: Size,
    origin: Point,
    journal: Journal,
}

impl RenderSurface<ScriptedHandle> for ScriptedSurface {
    fn dimensions(&self) -> Size {
        self.size
    }

    fn page_origin(&self) -> Point {
        self.origin
    }

    fn attach(&mut self, node: &ScriptedHandle) {
        self.journal.push(Call::Attach(node.id));
    }

    fn detach(&mut self, node: &ScriptedHandle) {
        self.journal.push(Call::Detach(node.id));
    }

    fn destroy(self) {
        self.journal.push(Call::SurfaceDestroyed);
    }
}

pub struct ScriptedHandle {
    pub id: u32,
    size: Size,
    settings: ModelSettings,
    journal: Journal,
}

impl ModelHandle for ScriptedHandle {
    fn dimensions(&self) -> Size {
        self.size
    }

    fn set_scale(&mut self, scale: f32) {
        self.journal.push(Call::Scale(self.id, scale));
    }

    fn set_position(&mut self, position: Point) {
        self.journal.push(Call::Position(self.id, position));
    }

    fn settings(&self) -> ModelSettings {
        self.settings.clone()
    }

    fn focus(&mut self, x: f32, y: f32) {
        self.journal.push(Call::Focus(self.id, x, y));
    }

    fn tap(&mut self, x: f32, y: f32) {
        self.journal.push(Call::Tap(self.id, x, y));
    }

    fn trigger_expression(&mut self, name: &str) {
        self.journal.push(Call::Expression(self.id, name.to_string()));
    }

    fn trigger_motion(&mut self, group: &str, index: usize) {
        self.journal
            .push(Call::Motion(self.id, group.to_string(), index));
    }

    fn destroy(self) {
        self.journal.push(Call::HandleDestroyed(self.id));
    }
}

pub struct ScriptedLoader {
    journal: Journal,
    gates: Gates,
    next_id: Rc<Cell<u32>>,
}

fn model_name(manifest: &str) -> Option<String> {
    let file = manifest.rsplit('/').next()?;
    file.split('.').next().map(str::to_string)
}

impl ModelLoader for ScriptedLoader {
    type Handle = ScriptedHandle;

    fn resolve(
        &self,
        manifest: &str,
        options: &LoadOptions,
    ) -> LocalBoxFuture<'static, Result<ScriptedHandle, BackendError>> {
        assert!(!options.auto_interact, "session must disable auto interaction");
        let gate = self.gates.take(manifest);
        let journal = self.journal.clone();
        let next_id = Rc::clone(&self.next_id);
        let manifest = manifest.to_string();
        async move {
            if let Some(gate) = gate {
                gate.await
                    .map_err(|_| BackendError::new("load abandoned"))?
                    .map_err(BackendError::new)?;
            }
            let name = model_name(&manifest)
                .ok_or_else(|| BackendError::new(format!("bad manifest path {manifest}")))?;
            let entry = models::entry(&name)
                .map_err(|_| BackendError::new(format!("404 Not Found: {manifest}")))?;
            let raw = models::manifest_json(&name).map_err(|e| BackendError::new(e.to_string()))?;
            let settings = ModelSettings::from_manifest_json(&raw)
                .map_err(|e| BackendError::new(e.to_string()))?;

            let id = next_id.get();
            next_id.set(id + 1);
            journal.push(Call::HandleCreated {
                id,
                model: name.clone(),
            });
            Ok::<_, BackendError>(ScriptedHandle {
                id,
                size: Size::new(entry.width, entry.height),
                settings,
                journal,
            })
        }
        .boxed_local()
    }
}

pub struct ScriptedBackend {
    journal: Journal,
    gates: Gates,
    surface_mode: RefCell<Option<SurfaceMode>>,
    runtime_failures: Cell<u32>,
    next_id: Rc<Cell<u32>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    /// Several backends may share one journal (e.g. two sessions on a page).
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            gates: Gates::default(),
            surface_mode: RefCell::new(Some(SurfaceMode::Immediate)),
            runtime_failures: Cell::new(0),
            next_id: Rc::new(Cell::new(1)),
        }
    }

    pub fn surface(self, mode: SurfaceMode) -> Self {
        *self.surface_mode.borrow_mut() = Some(mode);
        self
    }

    /// Fail the first `n` runtime initializations.
    pub fn failing_runtime(self, n: u32) -> Self {
        self.runtime_failures.set(n);
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn gates(&self) -> Gates {
        self.gates.clone()
    }
}

impl Backend for ScriptedBackend {
    type Container = TestContainer;
    type Handle = ScriptedHandle;
    type Surface = ScriptedSurface;
    type Loader = ScriptedLoader;

    fn create_surface(
        &self,
        container: TestContainer,
        options: &SurfaceOptions,
    ) -> LocalBoxFuture<'static, Result<ScriptedSurface, BackendError>> {
        assert!(options.transparent_background && options.smoothing && options.autosize);
        let mode = self
            .surface_mode
            .borrow_mut()
            .take()
            .unwrap_or(SurfaceMode::Immediate);
        let journal = self.journal.clone();
        async move {
            match mode {
                SurfaceMode::Immediate => {}
                SurfaceMode::Fail(message) => return Err(BackendError::new(message)),
                SurfaceMode::Deferred(rx) => {
                    rx.await.map_err(|_| BackendError::new("surface abandoned"))?;
                }
            }
            journal.push(Call::SurfaceCreated);
            Ok::<_, BackendError>(ScriptedSurface {
                size: container.size,
                origin: container.origin,
                journal,
            })
        }
        .boxed_local()
    }

    fn load_runtime(&self) -> LocalBoxFuture<'static, Result<ScriptedLoader, BackendError>> {
        self.journal.push(Call::RuntimeRequested);
        let failures = self.runtime_failures.get();
        if failures > 0 {
            self.runtime_failures.set(failures - 1);
            return async { Err(BackendError::new("runtime script failed to load")) }.boxed_local();
        }
        let loader = ScriptedLoader {
            journal: self.journal.clone(),
            gates: self.gates.clone(),
            next_id: Rc::clone(&self.next_id),
        };
        async move { Ok(loader) }.boxed_local()
    }
}

pub fn spawn(pool: &LocalPool, fut: LoadFuture) {
    pool.spawner().spawn_local(fut).expect("spawn load future");
}

pub fn approx(a: f32, b: f32) {
    assert!((a - b).abs() <= 1e-4, "left={a} right={b}");
}
