use crate::application::runtime::{Runtime, Spawner, Timer};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Duration;

/// Spawns onto the browser microtask queue.
pub struct WasmSpawner;

impl Spawner for WasmSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// `setTimeout`-backed delays.
pub struct GlooTimer;

impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}

pub fn browser_runtime() -> Runtime {
    Runtime::new(Rc::new(WasmSpawner), Rc::new(GlooTimer))
}
