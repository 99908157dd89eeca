// src/services/mod.rs

pub mod access;
pub mod grading;
pub mod leaderboard;
pub mod recorder;
