//! sw-resources
//!
//! Client-side resource plumbing for a cross-platform (native and WASM) game
//! client: a scene cache that loads scenes in the background and tracks the
//! active one, the binary texture record format the client downloads for
//! every sprite, and the texture manager that produces those records from
//! the game's sprite archive.
//!
//! High-level modules
//! - `context`: paths and byte order shared by every loader
//! - `data_structures`: texture records, palettes and raw sprite data
//! - `resources`: asset loading, the sprite archive and the run-length codec
//! - `scene`: scene cache with pending/ready/failed lookups
//! - `texture_manager`: memory and disk cached texture records built from sprites
//!

pub mod context;
pub mod data_structures;
pub mod resources;
pub mod scene;
pub mod texture_manager;

// Re-exports commonly used types for convenience in downstream code.
pub use context::Context;
pub use data_structures::{
    palette::Palette,
    texture::{ByteOrder, Texture},
};
pub use scene::{SceneCache, SceneId, SceneLookup};
pub use texture_manager::TextureManager;

/// Install the platform logger: `env_logger` natively, the browser console
/// on wasm. Calling it more than once is harmless.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("Logger was already initialized");
        }
    }
}
