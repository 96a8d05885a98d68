pub mod normalizer;
pub mod types;

pub use normalizer::{normalize, normalize_facebook_post, normalize_instagram_media};
pub use types::*;

// Module-level constants
pub const TARGET_ENTITY: &str = "entity";
