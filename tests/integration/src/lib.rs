//! End-to-end tests for the ParkWatch ingest pipeline
//!
//! This test suite validates:
//! - Signed sensor messages flowing from raw MQTT bytes to the served snapshot
//! - Rejection of forged, unknown and malformed messages without state change
//! - Advisory chain continuity across message loss
//! - Edge-triggered capacity alerts
//! - The HTTP read and override API over the same shared state

pub mod test_utils;

#[cfg(test)]
mod pipeline_tests;
