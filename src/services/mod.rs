// src/services/mod.rs
pub mod api_server;
pub mod init_data;
pub mod verifier;
