//! Operations spanning one or more stores.
//!
//! Storage gives per-document atomicity only. Counters move through atomic
//! increments, and a failure after the first write of a sequence is reported as
//! `AppError::Internal` naming what was already applied. Nothing is rolled back.

pub mod catalog;
pub mod ledger;
pub mod seating;
pub mod staff;
