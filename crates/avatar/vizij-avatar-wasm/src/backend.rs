//! Collaborator traits implemented over duck-typed JavaScript objects.
//!
//! Expected shapes (all methods may be plain functions or class methods):
//!
//! ```text
//! backend: { createSurface(container, options) -> Promise<surface> | surface,
//!            loadRuntime() -> Promise<loader> | loader }
//! surface: { width: number, height: number,
//!            addModel(model), removeModel(model), destroy() }
//! loader:  { fromManifest(url, options) -> Promise<model> | model }
//! model:   { width: number, height: number, settings: object,
//!            setScale(s), setPosition(x, y), focus(x, y), tap(x, y),
//!            expression(name), motion(group, index), destroy() }
//! ```

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Promise, JSON};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlElement;

use vizij_avatar_core::{
    Backend, BackendError, LoadOptions, ModelHandle, ModelLoader, ModelSettings, Point,
    RenderSurface, Size, SurfaceOptions,
};

#[wasm_bindgen]
extern "C" {
    pub type JsBackend;

    #[wasm_bindgen(method, catch, js_name = createSurface)]
    fn create_surface(
        this: &JsBackend,
        container: &HtmlElement,
        options: &JsValue,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadRuntime)]
    fn load_runtime(this: &JsBackend) -> Result<JsValue, JsValue>;

    pub type JsSurface;

    #[wasm_bindgen(method, getter)]
    fn width(this: &JsSurface) -> f64;

    #[wasm_bindgen(method, getter)]
    fn height(this: &JsSurface) -> f64;

    #[wasm_bindgen(method, catch, js_name = addModel)]
    fn add_model(this: &JsSurface, model: &JsModel) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeModel)]
    fn remove_model(this: &JsSurface, model: &JsModel) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = destroy)]
    fn destroy_surface(this: &JsSurface) -> Result<(), JsValue>;

    pub type JsLoader;

    #[wasm_bindgen(method, catch, js_name = fromManifest)]
    fn from_manifest(this: &JsLoader, url: &str, options: &JsValue) -> Result<JsValue, JsValue>;

    pub type JsModel;

    #[wasm_bindgen(method, getter = width)]
    fn model_width(this: &JsModel) -> f64;

    #[wasm_bindgen(method, getter = height)]
    fn model_height(this: &JsModel) -> f64;

    #[wasm_bindgen(method, getter)]
    fn settings(this: &JsModel) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = setScale)]
    fn set_scale(this: &JsModel, scale: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setPosition)]
    fn set_position(this: &JsModel, x: f64, y: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn focus(this: &JsModel, x: f64, y: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn tap(this: &JsModel, x: f64, y: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn expression(this: &JsModel, name: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn motion(this: &JsModel, group: &str, index: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = destroy)]
    fn destroy_model(this: &JsModel) -> Result<(), JsValue>;
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe_js_error(v: &JsValue) -> String {
    if let Some(err) = v.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    if let Some(s) = v.as_string() {
        return s;
    }
    format!("{v:?}")
}

fn backend_error(context: &str, v: JsValue) -> BackendError {
    BackendError::new(format!("{context}: {}", describe_js_error(&v)))
}

/// Await a value that may or may not be a thenable.
async fn settle(value: JsValue, context: &'static str) -> Result<JsValue, BackendError> {
    JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(|e| backend_error(context, e))
}

/// Fire-and-forget calls on a collaborator: a throw is logged, not raised.
fn log_throw(context: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::warn!("{context} threw: {}", describe_js_error(&e));
    }
}

pub struct WasmSurface {
    js: JsSurface,
    container: HtmlElement,
}

impl RenderSurface<WasmModel> for WasmSurface {
    fn dimensions(&self) -> Size {
        Size::new(self.js.width() as f32, self.js.height() as f32)
    }

    fn page_origin(&self) -> Point {
        let rect = self.container.get_bounding_client_rect();
        let (sx, sy) = web_sys::window()
            .map(|w| (w.scroll_x().unwrap_or(0.0), w.scroll_y().unwrap_or(0.0)))
            .unwrap_or((0.0, 0.0));
        Point::new((rect.left() + sx) as f32, (rect.top() + sy) as f32)
    }

    fn attach(&mut self, node: &WasmModel) {
        log_throw("surface.addModel", self.js.add_model(&node.js));
    }

    fn detach(&mut self, node: &WasmModel) {
        log_throw("surface.removeModel", self.js.remove_model(&node.js));
    }

    fn destroy(self) {
        log_throw("surface.destroy", self.js.destroy_surface());
    }
}

pub struct WasmModel {
    js: JsModel,
}

impl ModelHandle for WasmModel {
    fn dimensions(&self) -> Size {
        Size::new(self.js.model_width() as f32, self.js.model_height() as f32)
    }

    fn set_scale(&mut self, scale: f32) {
        log_throw("model.setScale", self.js.set_scale(scale as f64));
    }

    fn set_position(&mut self, position: Point) {
        log_throw(
            "model.setPosition",
            self.js.set_position(position.x as f64, position.y as f64),
        );
    }

    fn settings(&self) -> ModelSettings {
        let raw = self.js.settings();
        if raw.is_undefined() || raw.is_null() {
            return ModelSettings::default();
        }
        // Reuse the manifest parser so both manifest dialects are accepted.
        let parsed = JSON::stringify(&raw)
            .map_err(|e| describe_js_error(&e))
            .and_then(|s| {
                s.as_string()
                    .ok_or_else(|| "settings did not stringify".to_string())
            })
            .and_then(|s| ModelSettings::from_manifest_json(&s).map_err(|e| e.to_string()));
        match parsed {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("model settings unreadable: {e}");
                ModelSettings::default()
            }
        }
    }

    fn focus(&mut self, x: f32, y: f32) {
        log_throw("model.focus", self.js.focus(x as f64, y as f64));
    }

    fn tap(&mut self, x: f32, y: f32) {
        log_throw("model.tap", self.js.tap(x as f64, y as f64));
    }

    fn trigger_expression(&mut self, name: &str) {
        log_throw("model.expression", self.js.expression(name));
    }

    fn trigger_motion(&mut self, group: &str, index: usize) {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        log_throw("model.motion", self.js.motion(group, index));
    }

    fn destroy(self) {
        log_throw("model.destroy", self.js.destroy_model());
    }
}

pub struct WasmLoader {
    js: JsLoader,
}

impl ModelLoader for WasmLoader {
    type Handle = WasmModel;

    fn resolve(
        &self,
        manifest: &str,
        options: &LoadOptions,
    ) -> LocalBoxFuture<'static, Result<WasmModel, BackendError>> {
        let started = swb::to_value(options)
            .map_err(|e| BackendError::new(format!("load options: {e}")))
            .and_then(|opts| {
                self.js
                    .from_manifest(manifest, &opts)
                    .map_err(|e| backend_error("fromManifest", e))
            });
        async move {
            let model = settle(started?, "fromManifest").await?;
            if model.is_undefined() || model.is_null() {
                return Err(BackendError::new("fromManifest resolved to nothing"));
            }
            Ok(WasmModel {
                js: model.unchecked_into(),
            })
        }
        .boxed_local()
    }
}

/// Adapter from the JS backend object to the core [`Backend`] trait.
pub struct WasmBackend {
    js: JsBackend,
}

impl WasmBackend {
    pub fn new(js: JsValue) -> Self {
        Self {
            js: js.unchecked_into(),
        }
    }
}

impl Backend for WasmBackend {
    type Container = HtmlElement;
    type Handle = WasmModel;
    type Surface = WasmSurface;
    type Loader = WasmLoader;

    fn create_surface(
        &self,
        container: HtmlElement,
        options: &SurfaceOptions,
    ) -> LocalBoxFuture<'static, Result<WasmSurface, BackendError>> {
        let started = swb::to_value(options)
            .map_err(|e| BackendError::new(format!("surface options: {e}")))
            .and_then(|opts| {
                self.js
                    .create_surface(&container, &opts)
                    .map_err(|e| backend_error("createSurface", e))
            });
        async move {
            let surface = settle(started?, "createSurface").await?;
            if surface.is_undefined() || surface.is_null() {
                return Err(BackendError::new("createSurface resolved to nothing"));
            }
            Ok(WasmSurface {
                js: surface.unchecked_into(),
                container,
            })
        }
        .boxed_local()
    }

    fn load_runtime(&self) -> LocalBoxFuture<'static, Result<WasmLoader, BackendError>> {
        let started = self
            .js
            .load_runtime()
            .map_err(|e| backend_error("loadRuntime", e));
        async move {
            let loader = settle(started?, "loadRuntime").await?;
            if loader.is_undefined() || loader.is_null() {
                return Err(BackendError::new("loadRuntime resolved to nothing"));
            }
            Ok(WasmLoader {
                js: loader.unchecked_into(),
            })
        }
        .boxed_local()
    }
}
