// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `do_next` / `do_later` — the two scheduling idioms every subsystem in
//! this workspace builds on instead of calling `Scheduler::queue` raw.

use std::time::Duration;

use edgeproxy_core::TimerId;

use crate::scheduler::Scheduler;

/// Schedule immediate execution (`__do_next` in the original macro set).
pub fn do_next(scheduler: &Scheduler, name: &'static str, action: impl FnOnce() + Send + 'static) {
    scheduler.queue(name, Duration::ZERO, None, action);
}

/// Schedule delayed execution, clearing any previously scheduled task under
/// the same `key` first (`__do_later`). This is the debounce idiom: calling
/// `do_later` repeatedly with the same key restarts the delay instead of
/// stacking up duplicate runs, matching `prx_scheduler_clear` + `_queue`.
pub fn do_later(
    scheduler: &Scheduler,
    key: TimerId,
    name: &'static str,
    delay: Duration,
    action: impl FnOnce() + Send + 'static,
) {
    scheduler.clear(key.clone());
    scheduler.queue(name, delay, Some(key), action);
}

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;
