// src/lib.rs — Library root for tandem

pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod report;
