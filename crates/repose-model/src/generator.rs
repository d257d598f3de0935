//! The pose-conditioned generator network.
//!
//! An encoder of downsampling blocks compresses the source image together
//! with the source and target pose heatmaps, a stack of residual blocks
//! refines the bottleneck at fixed resolution, and a mirrored decoder of
//! upsampling blocks restores the input resolution as a 3-channel
//! synthesized image. Equal encoder and decoder depth is what guarantees
//! the output resolution equals the input resolution.

use candle_core::{Result, Tensor};
use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};

use repose_core::GridSize;

use crate::block::{ConvBlock, DownsampleBlock, ResidualBlock, UpsampleBlock, UpsampleMode};

/// Generator configuration.
///
/// Channel counts and depths are explicit so every instance is wired from
/// its own configuration value, never from shared defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Channels of the input and synthesized images.
    pub image_channels: usize,
    /// Channels of each pose heatmap.
    pub pose_channels: usize,
    /// Width of the stem; doubles at every downsampling step.
    pub base_channels: usize,
    /// Encoder depth; the decoder mirrors it.
    pub n_downsample: usize,
    /// Residual blocks at the bottleneck.
    pub n_residual: usize,
    /// How the decoder doubles resolution.
    pub upsample: UpsampleMode,
    /// Working resolution of inputs and output.
    pub image_size: GridSize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            image_channels: 3,
            pose_channels: 1,
            base_channels: 64,
            n_downsample: 2,
            n_residual: 6,
            upsample: UpsampleMode::NearestConv,
            image_size: GridSize::default(),
        }
    }
}

impl GeneratorConfig {
    /// Channels fed to the encoder: image plus source and target pose maps.
    pub fn input_channels(&self) -> usize {
        self.image_channels + 2 * self.pose_channels
    }

    /// Channel count at the bottleneck.
    pub fn bottleneck_channels(&self) -> usize {
        self.base_channels << self.n_downsample
    }

    fn validate(&self) -> Result<()> {
        if self.image_channels == 0 || self.pose_channels == 0 || self.base_channels == 0 {
            candle_core::bail!(
                "generator channel counts must be positive: image {}, pose {}, base {}",
                self.image_channels,
                self.pose_channels,
                self.base_channels
            );
        }
        let factor = 1usize << self.n_downsample;
        if self.image_size.height % factor != 0 || self.image_size.width % factor != 0 {
            candle_core::bail!(
                "image size {}x{} is not divisible by the downsampling factor {}",
                self.image_size.height,
                self.image_size.width,
                factor
            );
        }
        Ok(())
    }
}

/// Synthesized image plus the bottleneck activation, kept for inspection.
pub struct GeneratorOutput {
    pub image: Tensor,
    pub bottleneck: Tensor,
}

/// Encoder-bottleneck-decoder generator for pose-guided image synthesis.
#[derive(Debug)]
pub struct PoseGenerator {
    stem: ConvBlock,
    encoder: Vec<DownsampleBlock>,
    bottleneck: Vec<ResidualBlock>,
    decoder: Vec<UpsampleBlock>,
    head: ConvBlock,
    config: GeneratorConfig,
}

impl PoseGenerator {
    pub fn new(config: GeneratorConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;

        let stem = ConvBlock::new(
            config.input_channels(),
            config.base_channels,
            7,
            1,
            3,
            true,
            true,
            vb.pp("stem"),
        )?;

        let mut encoder = Vec::with_capacity(config.n_downsample);
        let mut channels = config.base_channels;
        for i in 0..config.n_downsample {
            encoder.push(DownsampleBlock::new(
                channels,
                channels * 2,
                vb.pp(format!("down_{}", i)),
            )?);
            channels *= 2;
        }

        let mut bottleneck = Vec::with_capacity(config.n_residual);
        for i in 0..config.n_residual {
            bottleneck.push(ResidualBlock::new(channels, vb.pp(format!("res_{}", i)))?);
        }

        // Decoder mirrors the encoder step for step.
        let mut decoder = Vec::with_capacity(config.n_downsample);
        for i in 0..config.n_downsample {
            decoder.push(UpsampleBlock::new(
                channels,
                channels / 2,
                config.upsample,
                true,
                true,
                vb.pp(format!("up_{}", i)),
            )?);
            channels /= 2;
        }

        let head = ConvBlock::new(
            channels,
            config.image_channels,
            7,
            1,
            3,
            false,
            false,
            vb.pp("head"),
        )?;

        Ok(Self {
            stem,
            encoder,
            bottleneck,
            decoder,
            head,
            config,
        })
    }

    /// Synthesize an image of the source person in the target pose.
    ///
    /// # Arguments
    /// * `src_img` - source images `[batch, image_channels, H, W]` in `[-1, 1]`
    /// * `src_pose` - source pose heatmaps `[batch, pose_channels, H, W]`
    /// * `tgt_pose` - target pose heatmaps `[batch, pose_channels, H, W]`
    ///
    /// # Returns
    /// The synthesized image in `[-1, 1]` at the input resolution, plus the
    /// bottleneck activation.
    pub fn generate(
        &self,
        src_img: &Tensor,
        src_pose: &Tensor,
        tgt_pose: &Tensor,
    ) -> Result<GeneratorOutput> {
        let x = Tensor::cat(&[src_img, src_pose, tgt_pose], 1)?;

        let mut x = self.stem.forward(&x)?;
        for block in &self.encoder {
            x = block.forward(&x)?;
        }
        for block in &self.bottleneck {
            x = block.forward(&x)?;
        }
        let bottleneck = x.clone();
        for block in &self.decoder {
            x = block.forward(&x)?;
        }
        let image = self.head.forward(&x)?.tanh()?;

        Ok(GeneratorOutput { image, bottleneck })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}
