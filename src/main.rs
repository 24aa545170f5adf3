// src/main.rs

//! # Telegram User Sync - Main Entry Point
//!
//! Authenticates Telegram Mini App launch data (`initData`) and keeps the
//! launching user's profile in a hosted Supabase table.
//!
//! ## Architecture Overview
//! 1. **Services Layer**: init-data parsing, signature verification, HTTP API
//! 2. **Storage Layer**: `SupabaseClient` for the hosted user table
//! 3. **Models**: decoded identity and stored row
//!
//! ## Environment Variables
//! - `TELEGRAM_BOT_TOKEN`: Bot token the launcher signs with
//! - `SUPABASE_URL`: Supabase project URL
//! - `SUPABASE_KEY`: Supabase service key
//! - `SUPABASE_TABLE`: (Optional) Target table (default: telegram_users)
//! - `BIND_ADDR`: (Optional) Listen address (default: 127.0.0.1:3000)
//! - `RUST_LOG`: (Optional) Log filter (default: info)

use crate::config::Settings;
use crate::services::api_server::ApiServer;
use anyhow::Context;
use dotenv::dotenv;
use std::net::SocketAddr;

// Module declarations (organized by functional domain)
mod config;        // Environment-backed settings
mod error;         // Typed failures
mod models;        // Data structures
mod services;      // Verification and API
mod storage;       // Hosted user store
mod utils;         // Helper functions

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Build verifier and store client
/// 3. Start API server
///
/// Missing bot token or store credentials do not stop startup; they are
/// logged and reported by the endpoint on every request.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("failed to load settings")?;
    log::debug!("loaded {:?}", settings);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR {:?}", settings.bind_addr))?;

    let api_server = ApiServer::from_settings(&settings);
    api_server.run(addr).await.context("API server failed")?;
    Ok(())
}
