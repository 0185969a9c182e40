//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across different test categories

// Not every test target uses every helper.
#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::time::Duration;

const WAIT_DEADLINE: Duration = Duration::from_secs(2);

/// Poll `condition` until it holds or the deadline passes. Keeps the
/// timing-sensitive playback tests honest without fixed sleeps.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_DEADLINE;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {WAIT_DEADLINE:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
