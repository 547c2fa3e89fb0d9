//! DOM pointer listeners feeding the session, with gaze updates coalesced to
//! one `requestAnimationFrame` callback per frame.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, PointerEvent};

use vizij_avatar_core::{Point, PointerButton, SessionController};

use crate::backend::WasmBackend;

type Session = SessionController<WasmBackend>;
type Listener = Closure<dyn FnMut(PointerEvent)>;

fn page_point(ev: &PointerEvent) -> Point {
    Point::new(ev.page_x() as f32, ev.page_y() as f32)
}

fn schedule_frame(session: &Session) {
    let Some(window) = web_sys::window() else {
        // No frame clock (e.g. a worker): flush right away.
        session.frame();
        return;
    };
    let deferred = session.clone();
    let callback = Closure::once_into_js(move || deferred.frame());
    if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
        // The frame window must close or gaze never schedules again.
        log::warn!("requestAnimationFrame failed: {e:?}");
        session.frame();
    }
}

/// Registered listeners; removed again on drop.
pub struct PointerBindings {
    registrations: Vec<(EventTarget, &'static str, Listener)>,
}

impl PointerBindings {
    /// Gaze follows the pointer anywhere on the page; taps only count on the
    /// container.
    pub fn install(container: &EventTarget, session: &Session) -> Result<Self, JsValue> {
        let mut bindings = Self {
            registrations: Vec::with_capacity(3),
        };

        let page: EventTarget = match web_sys::window() {
            Some(w) => w.into(),
            None => container.clone(),
        };

        let s = session.clone();
        bindings.listen(
            page,
            "pointermove",
            Closure::wrap(Box::new(move |ev: PointerEvent| {
                if s.pointer_move(page_point(&ev)) {
                    schedule_frame(&s);
                }
            }) as Box<dyn FnMut(PointerEvent)>),
        )?;

        let s = session.clone();
        bindings.listen(
            container.clone(),
            "pointerdown",
            Closure::wrap(Box::new(move |ev: PointerEvent| {
                s.pointer_down(PointerButton::from(ev.button()), page_point(&ev));
            }) as Box<dyn FnMut(PointerEvent)>),
        )?;

        let s = session.clone();
        bindings.listen(
            container.clone(),
            "pointerup",
            Closure::wrap(Box::new(move |ev: PointerEvent| {
                s.pointer_up(PointerButton::from(ev.button()), page_point(&ev));
            }) as Box<dyn FnMut(PointerEvent)>),
        )?;

        Ok(bindings)
    }

    fn listen(
        &mut self,
        target: EventTarget,
        event: &'static str,
        listener: Listener,
    ) -> Result<(), JsValue> {
        target.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())?;
        self.registrations.push((target, event, listener));
        Ok(())
    }
}

impl Drop for PointerBindings {
    fn drop(&mut self) {
        for (target, event, listener) in self.registrations.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        }
    }
}
