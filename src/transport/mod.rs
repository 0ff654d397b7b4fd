//! Invoking the active engine and classifying what came back.

pub mod http;

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use crate::engine::Payload;
use crate::manager::EngineHandle;
use crate::outcome::{Failure, Outcome};

/// Call the engine behind `handle` once. Never retries, never hangs past
/// `timeout`, never panics.
pub async fn invoke(handle: &EngineHandle, payload: &Payload, timeout: Duration) -> Outcome {
    let attempt = async {
        let slot = handle.slot().read().await;
        if slot.epoch != handle.epoch() {
            return Err(Failure::engine(format!(
                "engine '{}' was reconfigured while the request was pending",
                handle.identity()
            )));
        }
        match AssertUnwindSafe(slot.engine.invoke(payload))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(Failure::from),
            Err(panic) => Err(Failure::engine(panic_message(panic.as_ref()))),
        }
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(response)) => Outcome::Success {
            content: response.content,
            metadata: response.metadata,
        },
        Ok(Err(failure)) => Outcome::Failure(failure),
        Err(_) => Outcome::Failure(Failure::transport(format!(
            "no response within {}s",
            timeout.as_secs_f64()
        ))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("engine panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("engine panicked: {s}")
    } else {
        "engine panicked".to_string()
    }
}
