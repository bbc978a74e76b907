//! Test support utilities for placekeeper-engine tests.
//! These helpers are public to avoid dead_code warnings and are lightweight.
//! They are intended for use by the test suite only.

use std::time::Duration;

use tokio::{
    task,
    time::{Instant, sleep},
};

/// Let the clock run for `ms` and give spawned tasks a chance to finish.
///
/// With a paused clock this auto-advances; timers due within the window fire
/// in deadline order.
pub async fn advance_ms(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
    task::yield_now().await;
}

/// Await until `pred` holds, up to `timeout_ms`.
pub async fn wait_until<F>(timeout_ms: u64, mut pred: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if pred() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(1)).await;
    }
}
