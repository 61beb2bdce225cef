//! File I/O helpers for the monitoring core.

pub mod export;
