//! Career progression simulator for a ranked personnel hierarchy.
//!
//! [engine] holds the per-cycle promotion, excess absorption and retirement
//! rules; [data] loads rosters and rule files and writes results; [parallel]
//! runs scenarios side by side; [server] and [cli] are the outer surfaces.

pub mod cli;
pub mod data;
pub mod engine;
pub mod parallel;
pub mod server;
