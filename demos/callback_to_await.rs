//! Consumes the same kind of request twice: once through callbacks, once
//! through `start_and_await`. Every other request fails.

use errand::{BoxError, TaskLifecycle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use tracing::info;

static CALLS: AtomicUsize = AtomicUsize::new(0);

fn request() -> TaskLifecycle<String> {
    TaskLifecycle::builder().name("request").build(|interrupt| {
        interrupt.sleep(Duration::from_millis(500))?;

        let call = CALLS.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 1 {
            return Err::<String, BoxError>(format!("request #{call} was rejected").into());
        }

        Ok(format!("response to request #{call}"))
    })
}

#[errand::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (tx, rx) = mpsc::channel();
    let on_result = tx.clone();

    request().start(
        move || {
            let _ = tx.send(String::from("cancelled"));
        },
        move |outcome| {
            let line = match outcome {
                Ok(body) => format!("callback received: {body}"),
                Err(failure) => format!("callback failed: {failure}"),
            };
            let _ = on_result.send(line);
        },
    );
    info!("{}", rx.recv()?);

    match request().start_and_await().await? {
        Ok(body) => info!("await received: {body}"),
        Err(failure) => info!("await failed: {failure}"),
    }

    let cancelled = request();
    let canceller = cancelled.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        canceller.cancel();
    });

    match cancelled.start_and_await().await {
        Ok(outcome) => info!(?outcome, "finished before the cancel landed"),
        Err(err) => info!("await resolved: {err}"),
    }

    Ok(())
}
