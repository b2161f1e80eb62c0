// sw-texture - convert texture records to PNG
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use sw_resources::{ByteOrder, Palette, Texture};

#[derive(Parser, Debug)]
#[command(name = "sw-texture")]
#[command(about = "Decode a texture record and write it as a PNG", long_about = None)]
struct Cli {
    /// Texture record to decode
    input: PathBuf,

    /// PNG file to write
    output: PathBuf,

    /// Byte order of the record header (be or le)
    #[arg(long, default_value = "be")]
    byte_order: ByteOrder,

    /// Palette of 256 RGB triplets; a gray ramp is used when omitted
    #[arg(long)]
    palette: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    sw_resources::init_logging();
    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("cannot read {}", cli.input.display()))?;
    let texture = Texture::from_bytes(&bytes, cli.byte_order)
        .with_context(|| format!("cannot decode {}", cli.input.display()))?;
    log::info!(
        "Decoded {}x{} texture at offset ({}, {})",
        texture.width,
        texture.height,
        texture.x,
        texture.y
    );

    let palette = match &cli.palette {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("cannot read palette {}", path.display()))?;
            Palette::from_rgb_bytes(&raw)?
        }
        None => Palette::grayscale(),
    };

    texture
        .to_rgba_image(&palette)?
        .save_with_format(&cli.output, image::ImageFormat::Png)
        .with_context(|| format!("cannot write {}", cli.output.display()))?;
    println!("Wrote {}", cli.output.display());
    Ok(())
}
