//! Nightlife event ledger
//!
//! Tracks recurring nightlife events run at partner venues: how the operator
//! is paid (revenue share brackets, entrance deals, or both), what each night
//! earned and cost, and the resulting profit across events.
//!
//! The calculation modules (`brackets`, `calculations`, `summary`) are pure
//! functions over `model` values. Persistence and reporting sit on top.

pub mod brackets;
pub mod calculations;
pub mod config;
pub mod constants;
pub mod input;
pub mod model;
pub mod money;
pub mod reports;
pub mod store;
pub mod summary;
