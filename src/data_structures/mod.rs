//! Data structures shared by the loaders and the texture manager.
//!
//! - `texture` holds the texture record and its binary layout
//! - `palette` maps bitmap indices to RGBA colours
//! - `sprite` describes index entries and data blocks of the sprite archive

pub mod palette;
pub mod sprite;
pub mod texture;
