// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use edgeproxy_core::TimerId;
use std::sync::mpsc;
use std::time::Duration;

#[test]
fn immediate_tasks_run_in_fifo_order() {
    let scheduler = Scheduler::create(None);
    let (tx, rx) = mpsc::channel();

    for i in 0..5 {
        let tx = tx.clone();
        scheduler.queue("fifo", Duration::ZERO, None, move || {
            tx.send(i).expect("send");
        });
    }
    drop(tx);

    let order: Vec<i32> = rx.iter().take(5).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    scheduler.shutdown();
    scheduler.at_exit();
}

#[test]
fn delayed_task_does_not_run_before_its_deadline() {
    let scheduler = Scheduler::create(None);
    let (tx, rx) = mpsc::channel();

    scheduler.queue("late", Duration::from_millis(80), None, move || {
        tx.send(()).expect("send");
    });

    assert!(matches!(rx.recv_timeout(Duration::from_millis(20)), Err(mpsc::RecvTimeoutError::Timeout)));
    rx.recv_timeout(Duration::from_secs(1)).expect("eventually runs");

    scheduler.shutdown();
    scheduler.at_exit();
}

#[test]
fn kill_prevents_a_queued_task_from_running() {
    let scheduler = Scheduler::create(None);
    let (tx, rx) = mpsc::channel();

    let id = scheduler.queue("killable", Duration::from_millis(50), None, move || {
        tx.send(()).expect("send");
    });
    scheduler.kill(id);

    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(200)),
        Err(mpsc::RecvTimeoutError::Timeout)
    ));
    scheduler.shutdown();
    scheduler.at_exit();
}

#[test]
fn clear_cancels_every_task_under_a_key() {
    let scheduler = Scheduler::create(None);
    let key = TimerId::heartbeat("test-entry");
    let (tx, rx) = mpsc::channel();

    for _ in 0..3 {
        let tx = tx.clone();
        scheduler.queue("keyed", Duration::from_millis(50), Some(key.clone()), move || {
            tx.send(()).expect("send");
        });
    }
    scheduler.clear(key);

    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(200)),
        Err(mpsc::RecvTimeoutError::Timeout)
    ));
    scheduler.shutdown();
    scheduler.at_exit();
}

#[test]
fn runs_me_is_true_only_on_the_scheduler_thread() {
    let scheduler = Scheduler::create(None);
    assert!(!scheduler.runs_me());

    let (tx, rx) = mpsc::channel();
    let scheduler_clone = Arc::clone(&scheduler);
    scheduler.queue("affinity", Duration::ZERO, None, move || {
        tx.send(scheduler_clone.runs_me()).expect("send");
    });

    assert!(rx.recv_timeout(Duration::from_secs(1)).expect("ran"));
    scheduler.shutdown();
    scheduler.at_exit();
}

#[test]
fn release_all_cancels_outstanding_tasks_regardless_of_key() {
    let scheduler = Scheduler::create(None);
    let (tx, rx) = mpsc::channel();

    scheduler.queue("a", Duration::from_millis(50), None, {
        let tx = tx.clone();
        move || tx.send(()).expect("send")
    });
    scheduler.queue(
        "b",
        Duration::from_millis(50),
        Some(TimerId::sdclient_retry()),
        move || tx.send(()).expect("send"),
    );
    scheduler.release_all();

    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(200)),
        Err(mpsc::RecvTimeoutError::Timeout)
    ));
    scheduler.shutdown();
    scheduler.at_exit();
}

#[test]
fn a_panicking_task_does_not_take_down_the_scheduler() {
    let scheduler = Scheduler::create(None);
    let (tx, rx) = mpsc::channel();

    scheduler.queue("boom", Duration::ZERO, None, || panic!("scheduled task exploded"));
    scheduler.queue("after", Duration::from_millis(10), None, move || {
        tx.send(()).expect("send")
    });

    rx.recv_timeout(Duration::from_secs(1)).expect("scheduler kept running after the panic");
    scheduler.shutdown();
    scheduler.at_exit();
}
