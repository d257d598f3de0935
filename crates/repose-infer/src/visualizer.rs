//! Comparison-grid rendering.
//!
//! Each inference batch is persisted as one composite PNG for visual
//! inspection: one row per sample, with source, target, target pose and
//! synthesized panels side by side.

use std::path::Path;

use candle_core::{IndexOp, Tensor};
use image::{Rgb, RgbImage};

use repose_core::{Error, Result};

/// Render a `(3, H, W)` tensor in `[-1, 1]` as an RGB image.
pub fn image_panel(tensor: &Tensor) -> Result<RgbImage> {
    let data = tensor.to_vec3::<f32>()?;
    if data.len() != 3 {
        return Err(Error::Tensor(format!(
            "expected a 3-channel image tensor, got {} channels",
            data.len()
        )));
    }
    let (h, w) = (data[0].len(), data[0][0].len());
    let mut img = RgbImage::new(w as u32, h as u32);
    for y in 0..h {
        for x in 0..w {
            let byte =
                |ch: usize| ((data[ch][y][x] * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8;
            img.put_pixel(x as u32, y as u32, Rgb([byte(0), byte(1), byte(2)]));
        }
    }
    Ok(img)
}

/// Render a `(1, H, W)` pose tensor in `[0, 1]` as a grayscale RGB image.
pub fn pose_panel(tensor: &Tensor) -> Result<RgbImage> {
    let data = tensor.to_vec3::<f32>()?;
    if data.len() != 1 {
        return Err(Error::Tensor(format!(
            "expected a single-channel pose tensor, got {} channels",
            data.len()
        )));
    }
    let (h, w) = (data[0].len(), data[0][0].len());
    let mut img = RgbImage::new(w as u32, h as u32);
    for y in 0..h {
        for x in 0..w {
            let v = (data[0][y][x].clamp(0.0, 1.0) * 255.0).round() as u8;
            img.put_pixel(x as u32, y as u32, Rgb([v, v, v]));
        }
    }
    Ok(img)
}

/// Write the comparison grid for one batch.
///
/// All tensors are batched `[batch, C, H, W]`; row `b` of the grid shows
/// sample `b` as source | target | target pose | synthesized.
pub fn save_comparison_grid(
    src: &Tensor,
    tgt: &Tensor,
    tgt_pose: &Tensor,
    synthesized: &Tensor,
    path: &Path,
) -> Result<()> {
    let (batch, _, h, w) = src.dims4()?;
    let mut grid = RgbImage::new((w * 4) as u32, (h * batch) as u32);
    for b in 0..batch {
        let panels = [
            image_panel(&src.i(b)?)?,
            image_panel(&tgt.i(b)?)?,
            pose_panel(&tgt_pose.i(b)?)?,
            image_panel(&synthesized.i(b)?)?,
        ];
        for (col, panel) in panels.iter().enumerate() {
            image::imageops::replace(&mut grid, panel, (col * w) as i64, (b * h) as i64);
        }
    }
    grid.save(path)?;
    Ok(())
}
