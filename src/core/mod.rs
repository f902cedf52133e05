// src/core/mod.rs

pub mod budget;
pub mod cost;
pub mod prompts;
pub mod similarity;
pub mod types;
pub mod workflow;
