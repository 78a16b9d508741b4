use errand::task;
use errand::time::{Elapsed, sleep, timeout};
use std::time::{Duration, Instant};

#[errand::test]
async fn test_sleep_basic() {
    let start = Instant::now();
    sleep(Duration::from_millis(50)).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(50),
        "Sleep should wait at least the specified duration"
    );
}

#[errand::test]
async fn test_sleep_zero_duration() {
    let start = Instant::now();
    sleep(Duration::from_millis(0)).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(10),
        "Zero duration sleep should be fast"
    );
}

#[errand::test]
async fn test_sleep_deadline() {
    let before = Instant::now();
    let sleep = sleep(Duration::from_millis(30));

    assert!(sleep.deadline() >= before + Duration::from_millis(30));
    sleep.await;
    assert!(Instant::now() >= before + Duration::from_millis(30));
}

#[errand::test(worker_threads = 2)]
async fn test_sleeps_wake_in_deadline_order() {
    let start = Instant::now();

    let slow = task::spawn(async move {
        sleep(Duration::from_millis(60)).await;
        start.elapsed()
    });
    let fast = task::spawn(async move {
        sleep(Duration::from_millis(20)).await;
        start.elapsed()
    });

    let slow = slow.await.unwrap();
    let fast = fast.await.unwrap();

    assert!(fast >= Duration::from_millis(20));
    assert!(slow >= Duration::from_millis(60));
    assert!(fast < slow);
}

#[errand::test(worker_threads = 2)]
async fn test_sleep_moved_between_tasks() {
    let mut timer = Box::pin(sleep(Duration::from_millis(30)));
    assert!(futures::poll!(timer.as_mut()).is_pending());

    // Armed by this task, completed by another one.
    let handle = task::spawn(async move {
        timer.await;
        7
    });

    assert_eq!(handle.await, Ok(7));
}

#[errand::test]
async fn test_timeout_completes_before_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    let result = timeout(Duration::from_millis(200), handle).await;

    assert!(
        matches!(result, Ok(Ok(123))),
        "Timeout should return the task's output"
    );
}

#[errand::test]
async fn test_timeout_expires() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(100)).await;
        456
    });
    let result = timeout(Duration::from_millis(20), handle).await;

    assert_eq!(result.err(), Some(Elapsed));
}

#[test]
fn test_elapsed_display() {
    assert_eq!(Elapsed.to_string(), "deadline elapsed");
}
