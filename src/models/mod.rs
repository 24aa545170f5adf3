// src/models/mod.rs
pub mod telegram_user;
