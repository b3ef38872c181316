//! Cadence Core — periodic-rebalance backtesting engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, signals, policies, ledgers)
//! - Simulation calendar and rebalance schedule
//! - As-of price alignment onto the calendar
//! - Signal strategy trait with the mandatory one-bar lag
//! - The per-step portfolio state machine with both allocation policies
//! - NAV accumulation and reconciliation

pub mod calendar;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod signals;
