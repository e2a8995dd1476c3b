//! Test utilities for Bazaar crates and services.
//!
//! Provides an in-memory SQLite database with the outbox table, a scripted bus
//! with injectable publish failures, recording handlers and event fixtures.
//! Import from tests only, never from production code.

pub mod bus;
pub mod db;
pub mod fixture;
pub mod handler;
