//! The single-consumer mutation/draw queue (§5 "Concurrency & resource
//! model").
//!
//! Grounded in the teacher's closure-based connection-tracker hook
//! pattern (a callback capturing just the state it needs), generalized
//! from a single callback into a queue of them. Kept to `std::sync::mpsc`
//! rather than a third-party channel crate — nothing else in the example
//! pack reaches for one for this shape, and `mpsc::Sender` already gives
//! the non-blocking-producer/blocking-consumer discipline this module
//! needs: producers (the input thread, push-update handler threads) never
//! block on `send`, and the single consumer (the draw thread) blocks on
//! `recv` between frames.

use std::sync::mpsc;

use tracing::error;

use crate::controller::Controller;

/// A unit of work submitted to the queue: a move-only closure that gets
/// exclusive access to the `Controller` when it runs on the draw thread.
pub type DrawJob = Box<dyn FnOnce(&mut Controller) + Send>;

#[derive(Clone)]
pub struct RenderQueue {
    tx: mpsc::Sender<DrawJob>,
}

pub struct RenderQueueConsumer {
    rx: mpsc::Receiver<DrawJob>,
}

/// Creates a queue. The `RenderQueue` handle is cloned and handed to
/// every producer thread; `RenderQueueConsumer` is owned solely by the
/// draw thread.
pub fn channel() -> (RenderQueue, RenderQueueConsumer) {
    let (tx, rx) = mpsc::channel();
    (RenderQueue { tx }, RenderQueueConsumer { rx })
}

impl RenderQueue {
    /// Enqueues a job. Never blocks the caller (§5 "non-blocking for the
    /// producer"). A closed receiver (draw thread already exited) is
    /// silently dropped — that only happens during shutdown teardown.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce(&mut Controller) + Send + 'static,
    {
        let _ = self.tx.send(Box::new(job));
    }
}

impl RenderQueueConsumer {
    /// Blocks until a job arrives, then applies it. Returns `false` once
    /// every producer handle has been dropped, signaling the draw loop to
    /// exit.
    pub fn run_one(&self, controller: &mut Controller) -> bool {
        match self.rx.recv() {
            Ok(job) => {
                job(controller);
                true
            }
            Err(_) => false,
        }
    }

    /// Drains the queue in FIFO order until empty or a job reports `Quit`
    /// by setting `controller.is_running = false` — used by the main draw
    /// loop in `main.rs`.
    pub fn run_until_quit(&self, controller: &mut Controller) {
        while controller.is_running {
            match self.rx.recv() {
                Ok(job) => job(controller),
                Err(_) => break,
            }
        }
    }
}

/// Wraps a job so a panic inside it is caught and logged instead of
/// poisoning the draw thread (§7 "the draw loop also wraps each popped
/// closure in a logged catch-all"). `catch_unwind` requires `UnwindSafe`;
/// callers that need this should route through here rather than calling
/// `job(controller)` directly in production code.
pub fn guarded<F>(job: F) -> DrawJob
where
    F: FnOnce(&mut Controller) + Send + 'static,
{
    Box::new(move |controller: &mut Controller| {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| job(controller)));
        if let Err(panic) = result {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(panic = %msg, "draw job panicked");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Closures submitted from multiple threads are applied in submission
    /// order. True multi-thread interleaving isn't deterministically
    /// observable in a unit test, so this drives the queue from a single
    /// thread in a known submission order and checks application order —
    /// the property under test is FIFO application, not concurrent
    /// submission itself.
    #[test]
    fn jobs_apply_in_fifo_order() {
        let (queue, consumer) = channel();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            queue.submit(move |_controller| {
                order.lock().unwrap().push(i);
            });
        }
        drop(queue);
        let mut controller = Controller::for_test();
        while consumer.run_one(&mut controller) {}
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn guarded_job_logs_panic_without_propagating() {
        let (queue, consumer) = channel();
        queue.submit(move |controller: &mut Controller| {
            let job = guarded(|_c: &mut Controller| panic!("boom"));
            job(controller);
        });
        drop(queue);
        let mut controller = Controller::for_test();
        assert!(consumer.run_one(&mut controller));
    }
}
