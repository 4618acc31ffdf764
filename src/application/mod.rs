//! Application layer containing the core business logic orchestration.
//!
//! The `LedgerEngine` runs one job inside one atomic unit of work, the
//! `WorkerPool` bounds and schedules jobs across a fixed set of workers, and
//! the `LedgerService` composes them with the post-commit audit and cache
//! side effects.

pub mod audit;
pub mod cache;
pub mod engine;
pub mod pool;
pub mod service;
