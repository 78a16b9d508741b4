//! Looks up a user and their details on two lifecycles at once. The total
//! time follows the slower lookup, and the whole fan-out is bounded.

use anyhow::Context;
use errand::time::timeout;
use errand::{BoxError, TaskLifecycle};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug)]
struct User {
    id: u32,
    name: String,
}

#[derive(Debug)]
struct Details {
    email: String,
    plan: &'static str,
}

fn lookup_user(id: u32) -> TaskLifecycle<User> {
    TaskLifecycle::builder().name("user").build(move |interrupt| {
        interrupt.sleep(Duration::from_millis(300))?;
        Ok::<_, BoxError>(User {
            id,
            name: format!("user-{id}"),
        })
    })
}

fn lookup_details(id: u32) -> TaskLifecycle<Details> {
    TaskLifecycle::builder().name("details").build(move |interrupt| {
        interrupt.sleep(Duration::from_millis(500))?;
        Ok::<_, BoxError>(Details {
            email: format!("user-{id}@example.com"),
            plan: "standard",
        })
    })
}

#[errand::main(worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let start = Instant::now();

    let user = errand::spawn(lookup_user(7).start_and_await());
    let details = errand::spawn(lookup_details(7).start_and_await());

    let (user, details) = timeout(Duration::from_secs(2), async move {
        (user.await, details.await)
    })
    .await
    .context("lookups timed out")?;

    let user = user???;
    let details = details???;

    info!(
        elapsed = ?start.elapsed(),
        user.id = user.id,
        user.name = %user.name,
        email = %details.email,
        plan = details.plan,
        "profile assembled"
    );

    // A bound shorter than the slower lookup cancels it.
    let slow = lookup_details(8);
    let result = timeout(Duration::from_millis(100), slow.start_and_await()).await;
    info!(timed_out = result.is_err(), status = ?slow.status(), "bounded lookup");

    Ok(())
}
