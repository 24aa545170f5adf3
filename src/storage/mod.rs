// src/storage/mod.rs
pub mod supabase_client;
