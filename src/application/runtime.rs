use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Duration;

/// Runs detached tasks on the single UI thread.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Delay source for polling and deferred work.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Spawner + timer pair shared by every task the panel starts.
#[derive(Clone)]
pub struct Runtime {
    spawner: Rc<dyn Spawner>,
    timer: Rc<dyn Timer>,
}

impl Runtime {
    pub fn new(spawner: Rc<dyn Spawner>, timer: Rc<dyn Timer>) -> Self {
        Self { spawner, timer }
    }

    pub fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner.spawn(task);
    }

    pub fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.timer.sleep(duration)
    }
}
