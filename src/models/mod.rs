// src/models/mod.rs

pub mod attempt;
pub mod purchase;
pub mod question;
pub mod quiz;
pub mod user;
