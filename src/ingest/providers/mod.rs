// src/ingest/providers/mod.rs
pub mod atom_http;
pub mod file;
