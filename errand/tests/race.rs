mod common;

use common::{WAIT, init_test_tracing};
use errand::{BoxError, Completion, Outcome, TaskLifecycle, TaskStatus};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// Per case; the three cases add up to just over 1000 trials.
const TRIALS: usize = 334;

#[derive(Default)]
struct Counters {
    cancels: AtomicUsize,
    results: AtomicUsize,
}

/// Cancels a ~5 ms task at roughly the moment it completes and checks that
/// exactly one callback fired for every trial.
#[rstest]
#[case::before_completion(Duration::from_millis(4))]
#[case::at_completion(Duration::from_millis(5))]
#[case::after_completion(Duration::from_millis(6))]
fn test_cancel_races_completion(#[case] offset: Duration) {
    init_test_tracing();

    let mut trials = Vec::with_capacity(TRIALS);

    for _ in 0..TRIALS {
        let task = TaskLifecycle::new(|_| {
            thread::sleep(Duration::from_millis(5));
            Ok::<_, BoxError>(())
        });

        let counters = Arc::new(Counters::default());
        let (fired_tx, fired_rx) = mpsc::channel();

        {
            let cancel_counters = Arc::clone(&counters);
            let fired = fired_tx.clone();
            let on_cancel = move || {
                cancel_counters.cancels.fetch_add(1, Ordering::SeqCst);
                let _ = fired.send(());
            };

            let result_counters = Arc::clone(&counters);
            let on_result = move |_: Outcome<()>| {
                result_counters.results.fetch_add(1, Ordering::SeqCst);
                let _ = fired_tx.send(());
            };

            task.start(on_cancel, on_result);
        }

        thread::sleep(offset);
        task.cancel();

        fired_rx
            .recv_timeout(WAIT)
            .expect("no callback fired for a started task");

        trials.push((task, counters));
    }

    // Let detached workers whose completion lost the race return.
    thread::sleep(Duration::from_millis(50));

    for (task, counters) in &trials {
        let cancels = counters.cancels.load(Ordering::SeqCst);
        let results = counters.results.load(Ordering::SeqCst);

        assert_eq!(cancels + results, 1, "task {} fired {cancels} + {results}", task.id());

        let expected = if cancels == 1 {
            TaskStatus::Cancelled
        } else {
            TaskStatus::Completed(Completion::Succeeded)
        };
        assert_eq!(task.status(), expected);
    }
}
