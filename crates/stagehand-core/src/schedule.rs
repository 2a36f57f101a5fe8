//! Single-threaded cooperative runtime.
//!
//! The host owns a [`Scheduler`] and calls [`Scheduler::tick`] once per
//! frame. Routines suspend on the [`Clock`] (next frame, timed delay) or on
//! the external loader, and resume when the pool is next run. Nothing here
//! spawns a thread.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::executor::{LocalPool, LocalSpawner};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ClockState {
    elapsed: f64,
    frame: u64,
    waiters: Vec<Waker>,
}

/// Shared frame/time source. Clones observe the same time.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    state: Rc<RefCell<ClockState>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds advanced since creation.
    pub fn elapsed(&self) -> f64 {
        self.state.borrow().elapsed
    }

    /// Frames advanced since creation.
    pub fn frame(&self) -> u64 {
        self.state.borrow().frame
    }

    /// Move time forward by one frame of `dt` seconds and wake every
    /// suspended waiter. Negative `dt` is treated as zero.
    pub fn advance(&self, dt: f32) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            state.elapsed += f64::from(dt.max(0.0));
            state.frame += 1;
            std::mem::take(&mut state.waiters)
        };
        for waker in waiters {
            waker.wake();
        }
    }

    /// Resolves on the first frame after this call.
    pub fn next_frame(&self) -> NextFrame {
        NextFrame {
            clock: self.clone(),
            target: self.frame() + 1,
        }
    }

    /// Resolves once `seconds` of clock time have passed. Zero or negative
    /// delays resolve immediately.
    pub fn delay(&self, seconds: f32) -> Delay {
        Delay {
            clock: self.clone(),
            deadline: self.elapsed() + f64::from(seconds.max(0.0)),
        }
    }

    fn register(&self, waker: &Waker) {
        self.state.borrow_mut().waiters.push(waker.clone());
    }
}

/// Future returned by [`Clock::next_frame`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct NextFrame {
    clock: Clock,
    target: u64,
}

impl Future for NextFrame {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.frame() >= self.target {
            return Poll::Ready(());
        }
        self.clock.register(cx.waker());
        Poll::Pending
    }
}

/// Future returned by [`Clock::delay`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct Delay {
    clock: Clock,
    deadline: f64,
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.elapsed() >= self.deadline {
            return Poll::Ready(());
        }
        self.clock.register(cx.waker());
        Poll::Pending
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Frame-driven executor for every routine in the crate.
pub struct Scheduler {
    pool: LocalPool,
    clock: Clock,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("clock", &self.clock).finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            pool: LocalPool::new(),
            clock: Clock::new(),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Handle for spawning tasks onto this scheduler.
    pub fn spawner(&self) -> LocalSpawner {
        self.pool.spawner()
    }

    /// Advance one frame and run every task that can make progress.
    ///
    /// Tasks spawned since the last tick run first, at the old time, so their
    /// delays and frame waits start from the frame they were spawned in.
    pub fn tick(&mut self, dt: f32) {
        self.pool.run_until_stalled();
        self.clock.advance(dt);
        self.pool.run_until_stalled();
    }

    /// Run ready tasks without advancing time.
    pub fn run_until_idle(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Tick `frames` times with a fixed step.
    pub fn run_frames(&mut self, frames: u32, dt: f32) {
        for _ in 0..frames {
            self.tick(dt);
        }
    }

    /// Drive a future to completion on this scheduler, ticking `dt` per frame.
    /// Returns `None` if it has not finished after `max_frames`.
    pub fn block_on_frames<F>(&mut self, future: F, dt: f32, max_frames: u32) -> Option<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        use futures::task::LocalSpawnExt;

        let handle = self.spawner().spawn_local_with_handle(future).ok()?;
        let mut handle = Box::pin(handle);
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        self.run_until_idle();
        for _ in 0..=max_frames {
            if let Poll::Ready(output) = handle.as_mut().poll(&mut cx) {
                return Some(output);
            }
            self.tick(dt);
        }
        // Let the task observe the dropped handle and release its future.
        drop(handle);
        self.run_until_idle();
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::task::LocalSpawnExt;

    use super::*;

    #[test]
    fn next_frame_waits_for_advance() {
        let mut scheduler = Scheduler::new();
        let clock = scheduler.clock().clone();
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        scheduler
            .spawner()
            .spawn_local(async move {
                clock.next_frame().await;
                d.set(true);
            })
            .unwrap();

        scheduler.run_until_idle();
        assert!(!done.get());
        scheduler.tick(0.016);
        assert!(done.get());
    }

    #[test]
    fn delay_resolves_at_deadline() {
        let mut scheduler = Scheduler::new();
        let clock = scheduler.clock().clone();
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        scheduler
            .spawner()
            .spawn_local(async move {
                clock.delay(1.0).await;
                d.set(true);
            })
            .unwrap();

        scheduler.run_frames(3, 0.25);
        assert!(!done.get());
        scheduler.tick(0.25);
        assert!(done.get());
        assert_eq!(scheduler.clock().elapsed(), 1.0);
        assert_eq!(scheduler.clock().frame(), 4);
    }

    #[test]
    fn task_spawned_between_frames_starts_at_current_time() {
        let mut scheduler = Scheduler::new();
        scheduler.run_frames(2, 0.5);
        let clock = scheduler.clock().clone();
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        scheduler
            .spawner()
            .spawn_local(async move {
                clock.delay(0.5).await;
                d.set(true);
            })
            .unwrap();

        // No run_until_idle: the first tick has to start the task before
        // moving time.
        scheduler.tick(0.5);
        assert!(done.get());
        assert_eq!(scheduler.clock().elapsed(), 1.5);
    }

    #[test]
    fn zero_delay_is_immediate() {
        let mut scheduler = Scheduler::new();
        let clock = scheduler.clock().clone();
        let output = scheduler.block_on_frames(
            async move {
                clock.delay(0.0).await;
                7
            },
            0.5,
            0,
        );
        assert_eq!(output, Some(7));
    }

    #[test]
    fn block_on_frames_gives_up() {
        let mut scheduler = Scheduler::new();
        let clock = scheduler.clock().clone();
        let output = scheduler.block_on_frames(async move { clock.delay(10.0).await }, 0.5, 4);
        assert_eq!(output, None);
    }

    #[test]
    fn negative_dt_does_not_rewind() {
        let clock = Clock::new();
        clock.advance(0.5);
        clock.advance(-1.0);
        assert_eq!(clock.elapsed(), 0.5);
        assert_eq!(clock.frame(), 2);
    }
}
