//! Sovereign - freelancer dashboard backend.
//!
//! Manages clients, contracts and testimonials and runs AI-assisted document
//! analysis over them: contract risk scanning, negotiation email drafting,
//! client sentiment, asset mining and R&D credit audits.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod email;
pub mod llm;
pub mod models;
pub mod notify;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod utils;
