use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use js_sys::{Function, Promise};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlElement;

use vizij_avatar_core::{
    Catalog, Config, LoadFuture, LoaderCache, ModelId, SessionController, SessionError,
};

mod backend;
mod dom;

pub use backend::WasmBackend;
use backend::{describe_js_error, WasmLoader};
use dom::PointerBindings;

thread_local! {
    // One model runtime per page, shared by every session.
    static RUNTIME: LoaderCache<WasmLoader> = LoaderCache::new();
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn parse_config(config: JsValue) -> Result<Config, JsError> {
    if jsvalue_is_undefined_or_null(&config) {
        Ok(Config::default())
    } else {
        swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))
    }
}

fn session_error(e: SessionError) -> JsError {
    JsError::new(&e.to_string())
}

type Session = SessionController<WasmBackend>;
type OnChange = Rc<RefCell<Option<Function>>>;

fn notify(on_change: &OnChange, session: &Session) {
    let Some(callback) = on_change.borrow().clone() else {
        return;
    };
    match swb::to_value(&session.state()) {
        Ok(state) => {
            if let Err(e) = callback.call1(&JsValue::UNDEFINED, &state) {
                log::warn!("onChange callback threw: {}", describe_js_error(&e));
            }
        }
        Err(e) => log::warn!("state serialization failed: {e}"),
    }
}

/// One mounted avatar view.
#[wasm_bindgen]
pub struct AvatarSession {
    core: Session,
    bindings: Option<PointerBindings>,
    on_change: OnChange,
}

impl AvatarSession {
    /// Run `work` to completion as a promise, then notify the change callback.
    fn settle(&self, work: LoadFuture) -> Promise {
        let core = self.core.clone();
        let on_change = Rc::clone(&self.on_change);
        future_to_promise(async move {
            work.await;
            notify(&on_change, &core);
            Ok(JsValue::UNDEFINED)
        })
    }
}

#[wasm_bindgen]
impl AvatarSession {
    /// Create a session. `backend` supplies `createSurface(container, options)`
    /// and `loadRuntime()`; `config` is a JSON config object or undefined/null
    /// for defaults.
    /// Example:
    ///   new AvatarSession(backend, { default_model: "Hiyori" })
    #[wasm_bindgen(constructor)]
    pub fn new(backend: JsValue, config: JsValue) -> Result<AvatarSession, JsError> {
        console_error_panic_hook::set_once();

        if !backend.is_object() {
            return Err(JsError::new("backend must be an object"));
        }
        let cfg = parse_config(config)?;
        let loader = RUNTIME.with(|r| r.clone());

        Ok(AvatarSession {
            core: SessionController::new(WasmBackend::new(backend), loader, cfg),
            bindings: None,
            on_change: Rc::new(RefCell::new(None)),
        })
    }

    /// Create the rendering surface inside `container` and load the selected
    /// model. The returned promise resolves once that first load settles;
    /// failures are reported through `state().lastError`, not rejection.
    #[wasm_bindgen]
    pub fn initialize(&mut self, container: HtmlElement) -> Result<Promise, JsError> {
        let work = self.core.initialize(container.clone()).map_err(session_error)?;
        match PointerBindings::install(&container, &self.core) {
            Ok(bindings) => self.bindings = Some(bindings),
            Err(e) => log::warn!("pointer input unavailable: {}", describe_js_error(&e)),
        }
        Ok(self.settle(work))
    }

    /// Switch to model `id`. Resolves when this load settles or is superseded.
    #[wasm_bindgen(js_name = selectModel)]
    pub fn select_model(&self, id: String) -> Result<Promise, JsError> {
        let work = self.core.select_model(id).map_err(session_error)?;
        notify(&self.on_change, &self.core);
        Ok(self.settle(work))
    }

    #[wasm_bindgen(js_name = triggerExpression)]
    pub fn trigger_expression(&self, name: String) -> Result<(), JsError> {
        self.core.trigger_expression(&name).map_err(session_error)
    }

    /// `index` is 0-based within `group`.
    #[wasm_bindgen(js_name = triggerMotion)]
    pub fn trigger_motion(&self, group: String, index: u32) -> Result<(), JsError> {
        self.core
            .trigger_motion(&group, index as usize)
            .map_err(session_error)
    }

    /// Remove listeners, cancel pending loads and release the model and
    /// surface. Safe to call more than once.
    #[wasm_bindgen]
    pub fn teardown(&mut self) {
        self.bindings = None;
        self.core.teardown();
        notify(&self.on_change, &self.core);
    }

    /// Snapshot: `{ selectedModel, isLoading, lastError?, expressions, motions }`.
    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsError> {
        swb::to_value(&self.core.state()).map_err(|e| JsError::new(&format!("state error: {e}")))
    }

    /// Events recorded since the last call, oldest first.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsError> {
        swb::to_value(&self.core.drain_events())
            .map_err(|e| JsError::new(&format!("events error: {e}")))
    }

    /// Called with the state snapshot after every settled operation. Pass
    /// undefined/null to clear.
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&self, callback: JsValue) -> Result<(), JsError> {
        let next = if jsvalue_is_undefined_or_null(&callback) {
            None
        } else {
            Some(
                callback
                    .dyn_into::<Function>()
                    .map_err(|_| JsError::new("onChange must be a function"))?,
            )
        };
        *self.on_change.borrow_mut() = next;
        Ok(())
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}

/// Selectable model ids, in display order.
#[wasm_bindgen]
pub fn catalog() -> Result<JsValue, JsError> {
    swb::to_value(&Catalog::default().entries().to_vec())
        .map_err(|e| JsError::new(&format!("catalog error: {e}")))
}

/// Manifest URL the session would load for `id` under `config`.
#[wasm_bindgen(js_name = manifestPath)]
pub fn manifest_path(id: String, config: JsValue) -> Result<String, JsError> {
    let cfg = parse_config(config)?;
    Ok(cfg.catalog().manifest_path(&ModelId::new(id)))
}

/// Route `log` output to the browser console. `level` is one of
/// off/error/warn/info/debug/trace; undefined means "info". Later calls only
/// change the level.
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) -> Result<(), JsError> {
    let filter = match level {
        Some(l) => log::LevelFilter::from_str(&l)
            .map_err(|_| JsError::new(&format!("unknown log level '{l}'")))?,
        None => log::LevelFilter::Info,
    };
    if let Some(level) = filter.to_level() {
        if console_log::init_with_level(level).is_err() {
            log::debug!("console logger already installed");
        }
    }
    log::set_max_level(filter);
    Ok(())
}
