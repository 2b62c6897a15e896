// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Read-only catalog endpoints served through the process-wide anonymous
// client, plus the liveness probe.
pub mod catalog;
pub mod health;

pub use catalog::categories as catalog_categories;
pub use catalog::icons as catalog_icons;
pub use catalog::prompts as catalog_prompts;
pub use health::health;
