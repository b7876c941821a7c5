//! Leave Ledger & Attendance Reconciliation Engine
//!
//! This crate maintains per-employee monthly leave ledgers and keeps them
//! consistent with the attendance history: marking, bulk-marking, editing,
//! and undoing attendance all debit or credit the ledger atomically, with
//! carry-forward propagation across months and optimistic-concurrency
//! retries against the transactional store.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;
