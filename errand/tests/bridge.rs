mod common;

use common::init_test_tracing;
use errand::task::JoinError;
use errand::time::{Elapsed, sleep, timeout};
use errand::{
    BoxError, Cancelled, Completion, RuntimeBuilder, TaskFailure, TaskLifecycle, TaskStatus,
};
use futures::task::noop_waker_ref;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Context;
use std::thread;
use std::time::{Duration, Instant};

fn slow_task(observed: Arc<AtomicBool>) -> TaskLifecycle<&'static str> {
    TaskLifecycle::new(move |interrupt| {
        let slept = interrupt.sleep(Duration::from_secs(5));
        observed.store(slept.is_err(), Ordering::SeqCst);
        slept?;
        Ok::<_, BoxError>("too late")
    })
}

/// Waits until a detached worker has recorded whether it saw its interrupt.
fn wait_for(flag: &AtomicBool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !flag.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    flag.load(Ordering::SeqCst)
}

#[errand::test]
async fn test_await_success() {
    init_test_tracing();

    let task = TaskLifecycle::new(|_| Ok::<_, BoxError>(42));

    assert!(matches!(task.start_and_await().await, Ok(Ok(42))));
    assert_eq!(task.status(), TaskStatus::Completed(Completion::Succeeded));
}

#[errand::test]
async fn test_await_failure() {
    init_test_tracing();

    let task = TaskLifecycle::new(|_| Err::<u32, _>("boom"));

    match task.start_and_await().await {
        Ok(Err(TaskFailure::Failed(err))) => assert_eq!(err.to_string(), "boom"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[errand::test]
async fn test_await_question_mark() -> anyhow::Result<()> {
    init_test_tracing();

    let task = TaskLifecycle::new(|interrupt| {
        interrupt.sleep(Duration::from_millis(20))?;
        Ok::<_, BoxError>(String::from("payload"))
    });

    let value = task.start_and_await().await??;
    assert_eq!(value, "payload");

    Ok(())
}

#[errand::test]
async fn test_external_cancel_resolves_cancelled() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let canceller = task.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        canceller.cancel();
    });

    assert_eq!(task.start_and_await().await.err(), Some(Cancelled));
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(wait_for(&observed));
}

#[errand::test]
async fn test_already_started_resolves_cancelled() {
    init_test_tracing();

    let task = TaskLifecycle::new(|_| Ok::<_, BoxError>(1));
    task.start(|| {}, |_| {});

    assert_eq!(task.start_and_await().await.err(), Some(Cancelled));
}

#[errand::test]
async fn test_second_bridge_on_same_task() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let mut first = Box::pin(task.start_and_await());
    assert!(
        futures::poll!(first.as_mut()).is_pending(),
        "first bridge should be waiting on the worker"
    );

    assert_eq!(task.start_and_await().await.err(), Some(Cancelled));
    assert_eq!(task.status(), TaskStatus::Running);

    task.cancel();
    assert_eq!(first.await.err(), Some(Cancelled));
}

#[errand::test]
async fn test_timeout_cancels_task() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let result = timeout(Duration::from_millis(50), task.start_and_await()).await;

    assert!(result.is_err());
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(wait_for(&observed));
}

#[errand::test]
async fn test_expired_timeout_cancels_task_when_dropped() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let mut timed = Box::pin(timeout(Duration::from_millis(20), task.start_and_await()));
    assert_eq!(timed.as_mut().await.err(), Some(Elapsed));

    // The bridge is still owned by the expired timeout.
    assert_eq!(task.status(), TaskStatus::Running);

    drop(timed);
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(wait_for(&observed));
}

#[errand::test]
async fn test_timeout_passes_outcome_through() {
    init_test_tracing();

    let task = TaskLifecycle::new(|_| Ok::<_, BoxError>('x'));
    let result = timeout(Duration::from_secs(5), task.start_and_await()).await;

    assert!(matches!(result, Ok(Ok(Ok('x')))));
}

#[errand::test(worker_threads = 2)]
async fn test_abort_cancels_task() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let handle = {
        let task = task.clone();
        errand::spawn(async move { task.start_and_await().await })
    };

    sleep(Duration::from_millis(50)).await;
    assert_eq!(task.status(), TaskStatus::Running);

    handle.abort();

    assert_eq!(handle.await.err(), Some(JoinError::Cancelled));
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(wait_for(&observed));
}

#[test]
fn test_dropping_pending_bridge_cancels_task() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let mut cx = Context::from_waker(noop_waker_ref());
    let mut bridge = Box::pin(task.start_and_await());

    assert!(bridge.as_mut().poll(&mut cx).is_pending());
    assert_eq!(task.status(), TaskStatus::Running);

    drop(bridge);

    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(wait_for(&observed));
}

#[test]
fn test_unpolled_bridge_does_not_start() {
    let task = TaskLifecycle::new(|_| Ok::<_, BoxError>(()));

    drop(task.start_and_await());

    assert_eq!(task.status(), TaskStatus::Idle);
}

#[test]
fn test_runtime_drop_cancels_pending_bridge() {
    init_test_tracing();

    let observed = Arc::new(AtomicBool::new(false));
    let task = slow_task(observed.clone());

    let runtime = RuntimeBuilder::new().build().unwrap();
    let handle = {
        let task = task.clone();
        runtime.spawn(async move { task.start_and_await().await })
    };

    let deadline = Instant::now() + Duration::from_secs(2);
    while task.status() == TaskStatus::Idle && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(task.status(), TaskStatus::Running);

    // The spawned task is parked on the bridge, not queued.
    drop(runtime);

    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(handle.is_finished());
    assert!(wait_for(&observed));
}
