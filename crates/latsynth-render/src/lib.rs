//! # Latsynth Render
//!
//! Turns a 2D [`Projection`](latsynth_core::types::Projection) into a raster
//! image that resembles a noisy microscopy exposure.
//!
//! ## Pipeline
//!
//! 1. A square [`Canvas`](canvas::Canvas) with axis limits
//!    $\pm(w/2 + \text{margin})$ is acquired through a scoped session.
//! 2. Background speckle: thousands of faint discs with Poisson-distributed
//!    opacity emulate sensor noise.
//! 3. Synthetic blur layers: every point is drawn repeatedly with growing
//!    marker area and falling opacity to fake a point-spread function.
//! 4. The canvas is rasterised to RGB and a fixed border fraction is cropped.
//! 5. Optionally a real Gaussian or box convolution and a resize produce a
//!    second, blurred variant.
//!
//! ## Modules
//!
//! - [`config`]: Render settings and their defaults.
//! - [`canvas`]: The drawing surface and its scoped session.
//! - [`raster`]: Crop, convolution blur, and resize on RGB rasters.
//! - [`export`]: Atomic image file writing.
//! - [`renderer`]: The [`Renderer`](renderer::Renderer) tying it together.

pub mod canvas;
pub mod config;
pub mod export;
pub mod raster;
pub mod renderer;

use std::path::PathBuf;

use thiserror::Error;

pub use config::{BlurKind, BlurLayers, RenderConfig, SecondaryBlur, SpeckleConfig};
pub use renderer::{OutputPaths, RenderedImage, Renderer};

/// Errors raised while rendering or writing images.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid render parameter: {0}")]
    InvalidParameter(String),
}
