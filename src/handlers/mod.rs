// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth, shared anonymous client) → Protected (bearer auth, per-request scoped client)
pub mod public;    // /categories, /icons, /prompts, /health
pub mod protected; // /entries, /profile, /user/*
pub mod utils;

pub use public::*;
pub use protected::*;
