//! # repose-model
//!
//! The pose-conditioned generator network and its building blocks.
//!
//! ## Architecture
//!
//! The generator maps (source image, source pose, target pose) to an image
//! of the same person in the target pose:
//!
//! 1. **Stem**: wide convolution over the channel-concatenated inputs
//! 2. **Encoder**: downsampling blocks halving resolution, doubling width
//! 3. **Bottleneck**: residual blocks refining at fixed resolution
//! 4. **Decoder**: upsampling blocks mirroring the encoder
//! 5. **Head**: projection back to image channels, tanh-bounded
//!
//! All blocks carry fixed shape contracts so the composition's symmetry
//! (and with it the output resolution) is guaranteed by construction.

pub mod block;
pub mod generator;

pub use block::{ConvBlock, DownsampleBlock, ResidualBlock, UpsampleBlock, UpsampleMode};
pub use generator::{GeneratorConfig, GeneratorOutput, PoseGenerator};
