//! Reusable spatial transformation blocks.
//!
//! Four primitives with fixed shape contracts compose the generator:
//! [`ConvBlock`] preserves resolution at stride 1, [`ResidualBlock`] is
//! shape-invariant, [`DownsampleBlock`] exactly halves each spatial
//! dimension and [`UpsampleBlock`] exactly doubles them. Invalid channel
//! wiring is rejected when a block is built, not when it runs.

use candle_core::{Module, Result, Tensor};
use candle_nn::{
    conv2d_no_bias, conv_transpose2d_no_bias, group_norm, Conv2d, Conv2dConfig, ConvTranspose2d,
    ConvTranspose2dConfig, GroupNorm, VarBuilder,
};
use serde::{Deserialize, Serialize};

/// Convolution, then optional per-channel normalization, then optional ReLU.
///
/// Spatial size is preserved when stride is 1 and padding matches the
/// kernel; the output channel count is caller-specified.
#[derive(Debug)]
pub struct ConvBlock {
    conv: Conv2d,
    norm: Option<GroupNorm>,
    relu: bool,
}

impl ConvBlock {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        norm: bool,
        relu: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        if in_channels == 0 || out_channels == 0 {
            candle_core::bail!(
                "conv block channels must be positive, got {in_channels} -> {out_channels}"
            );
        }
        let config = Conv2dConfig {
            padding,
            stride,
            ..Default::default()
        };
        let conv = conv2d_no_bias(in_channels, out_channels, kernel_size, config, vb.pp("conv"))?;

        // Instance normalization: one group per channel.
        let norm = if norm {
            Some(group_norm(out_channels, out_channels, 1e-5, vb.pp("norm"))?)
        } else {
            None
        };

        Ok(Self { conv, norm, relu })
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mut x = self.conv.forward(x)?;
        if let Some(norm) = &self.norm {
            x = norm.forward(&x)?;
        }
        if self.relu {
            x = x.relu()?;
        }
        Ok(x)
    }
}

/// Two chained conv blocks with a skip connection.
///
/// Input and output channel counts and spatial size are identical: this
/// block refines features, it never resizes them.
#[derive(Debug)]
pub struct ResidualBlock {
    conv1: ConvBlock,
    conv2: ConvBlock,
}

impl ResidualBlock {
    pub fn new(channels: usize, vb: VarBuilder) -> Result<Self> {
        let conv1 = ConvBlock::new(channels, channels, 3, 1, 1, true, true, vb.pp("conv1"))?;
        let conv2 = ConvBlock::new(channels, channels, 3, 1, 1, true, false, vb.pp("conv2"))?;
        Ok(Self { conv1, conv2 })
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let out = self.conv1.forward(x)?;
        let out = self.conv2.forward(&out)?;
        let out = (out + x)?;
        out.relu()
    }
}

/// Strided convolution that exactly halves each spatial dimension.
#[derive(Debug)]
pub struct DownsampleBlock {
    conv: ConvBlock,
}

impl DownsampleBlock {
    pub fn new(in_channels: usize, out_channels: usize, vb: VarBuilder) -> Result<Self> {
        // 4x4 stride-2 padding-1: H -> H/2 for even H.
        let conv = ConvBlock::new(in_channels, out_channels, 4, 2, 1, true, true, vb.pp("conv"))?;
        Ok(Self { conv })
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        self.conv.forward(x)
    }
}

/// How an [`UpsampleBlock`] doubles the spatial resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsampleMode {
    /// 4x4 stride-2 transposed convolution.
    Transpose,
    /// Nearest-neighbor x2 magnification followed by a 3x3 convolution.
    NearestConv,
}

#[derive(Debug)]
enum Upsampler {
    Transpose(ConvTranspose2d),
    Nearest(Conv2d),
}

/// Exactly doubles each spatial dimension, mirroring [`DownsampleBlock`].
///
/// Both variants produce identical output shapes for identical input
/// shapes, so they are interchangeable at composition time.
#[derive(Debug)]
pub struct UpsampleBlock {
    up: Upsampler,
    norm: Option<GroupNorm>,
    relu: bool,
}

impl UpsampleBlock {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        mode: UpsampleMode,
        norm: bool,
        relu: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        if in_channels == 0 || out_channels == 0 {
            candle_core::bail!(
                "upsample block channels must be positive, got {in_channels} -> {out_channels}"
            );
        }
        let up = match mode {
            UpsampleMode::Transpose => {
                let config = ConvTranspose2dConfig {
                    padding: 1,
                    stride: 2,
                    ..Default::default()
                };
                Upsampler::Transpose(conv_transpose2d_no_bias(
                    in_channels,
                    out_channels,
                    4,
                    config,
                    vb.pp("up"),
                )?)
            }
            UpsampleMode::NearestConv => {
                let config = Conv2dConfig {
                    padding: 1,
                    ..Default::default()
                };
                Upsampler::Nearest(conv2d_no_bias(
                    in_channels,
                    out_channels,
                    3,
                    config,
                    vb.pp("up"),
                )?)
            }
        };
        let norm = if norm {
            Some(group_norm(out_channels, out_channels, 1e-5, vb.pp("norm"))?)
        } else {
            None
        };
        Ok(Self { up, norm, relu })
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mut x = match &self.up {
            Upsampler::Transpose(conv) => conv.forward(x)?,
            Upsampler::Nearest(conv) => {
                let (_, _, h, w) = x.dims4()?;
                conv.forward(&x.upsample_nearest2d(h * 2, w * 2)?)?
            }
        };
        if let Some(norm) = &self.norm {
            x = norm.forward(&x)?;
        }
        if self.relu {
            x = x.relu()?;
        }
        Ok(x)
    }
}
