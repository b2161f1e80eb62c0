use anyhow::Context as _;

use crate::{context::Context, data_structures::texture::Texture};

/**
 * This module contains all logic for loading scenes, textures and sprite data from external files.
 */
pub mod rle;
pub mod sprites;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window available"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

#[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
pub async fn load_string(ctx: &Context, file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = ctx.assets_dir.join(file_name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?
    };

    Ok(txt)
}

#[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
pub async fn load_binary(ctx: &Context, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = ctx.assets_dir.join(file_name);
        std::fs::read(&path)
            .with_context(|| format!("cannot read {}", path.display()))?
    };

    Ok(data)
}

/// Asset path of the texture record with the given id.
pub fn texture_file(id: u32) -> String {
    format!("textures/{id}.bin")
}

/// Asset path of the scene with the given id.
pub fn scene_file(id: u32) -> String {
    format!("scenes/{id}.bin")
}

/// Download and decode a texture record.
pub async fn load_texture(ctx: &Context, id: u32) -> anyhow::Result<Texture> {
    let file_name = texture_file(id);
    let data = load_binary(ctx, &file_name).await?;
    Texture::from_bytes(&data, ctx.byte_order)
        .with_context(|| format!("invalid texture record {file_name}"))
}
