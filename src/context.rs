//! Runtime configuration shared by the loaders, the scene cache and the
//! texture manager.

use std::path::PathBuf;

use crate::data_structures::texture::ByteOrder;

const ASSETS_DIR_VAR: &str = "SW_ASSETS_DIR";
const OUTPUT_DIR_VAR: &str = "SW_OUTPUT_DIR";
const BYTE_ORDER_VAR: &str = "SW_BYTE_ORDER";

/// Where assets are read from, where generated files go and how binary
/// records are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Root for `load_binary`/`load_string` on native targets.
    pub assets_dir: PathBuf,
    /// Root for generated files such as the texture disk cache.
    pub output_dir: PathBuf,
    /// Byte order of the 16-bit fields in texture records.
    pub byte_order: ByteOrder,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("./assets"),
            output_dir: PathBuf::from("./output"),
            byte_order: ByteOrder::default(),
        }
    }
}

impl Context {
    /// Build a context from the defaults overridden by `SW_ASSETS_DIR`,
    /// `SW_OUTPUT_DIR` and `SW_BYTE_ORDER`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut ctx = Self::default();
        if let Some(dir) = lookup(ASSETS_DIR_VAR) {
            ctx.assets_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(OUTPUT_DIR_VAR) {
            ctx.output_dir = PathBuf::from(dir);
        }
        if let Some(order) = lookup(BYTE_ORDER_VAR) {
            match order.parse() {
                Ok(order) => ctx.byte_order = order,
                Err(e) => log::warn!("Ignoring {BYTE_ORDER_VAR}: {e}"),
            }
        }
        ctx
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Directory of the texture manager's disk cache.
    pub fn texture_dir(&self) -> PathBuf {
        self.output_dir.join("textures")
    }
}
