use crate::error::HostError;
use dotclock_core::ppu::{CANVAS_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use std::path::Path;

/// RGB bytes of the presented 160x144 corner of the 256x256 canvas.
pub fn screen_to_rgb(canvas: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT * 3);
    for row in canvas.chunks_exact(CANVAS_SIZE).take(SCREEN_HEIGHT) {
        for &px in &row[..SCREEN_WIDTH] {
            out.extend_from_slice(&[(px >> 16) as u8, (px >> 8) as u8, px as u8]);
        }
    }
    out
}

pub fn write_png(path: &Path, canvas: &[u32]) -> Result<(), HostError> {
    let write_err = |source| HostError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let file = std::fs::File::create(path).map_err(write_err)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&screen_to_rgb(canvas))?;
    writer.finish()?;
    log::info!("wrote screenshot to {}", path.display());
    Ok(())
}
