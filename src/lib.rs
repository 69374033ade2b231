#![feature(int_roundings)]
#![doc(test(attr(deny(warnings))))]

//! Calendar Core provides the calendar and reminder primitives of a personal
//! finance application: event definitions, recurring occurrence expansion,
//! and the query service consumed by presentation layers.

pub mod config;
pub mod domain;
pub mod errors;
pub mod expansion;
pub mod service;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Calendar Core tracing initialized.");
    });
}
