//! The renderer: projection in, raster images out.

use std::path::{Path, PathBuf};

use image::RgbImage;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use latsynth_core::types::Projection;

use crate::canvas::{Canvas, CanvasSession};
use crate::config::{RenderConfig, SpeckleConfig};
use crate::export::save_image;
use crate::raster::{apply_blur, crop_border, resize_square};
use crate::RenderError;

/// Output of one render call.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Cropped, unblurred raster.
    pub sharp: RgbImage,
    /// Convolution-blurred and resized variant, if configured.
    pub blurred: Option<RgbImage>,
}

/// Destination paths for a [`RenderedImage`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub sharp: PathBuf,
    pub blurred: Option<PathBuf>,
}

impl RenderedImage {
    /// Write the sharp image and, when both the image and a path exist, the
    /// blurred variant. If the second write fails the first file is removed
    /// again, so a call either produces all its files or none.
    pub fn write(&self, paths: &OutputPaths) -> Result<(), RenderError> {
        save_image(&self.sharp, &paths.sharp)?;
        if let (Some(img), Some(path)) = (&self.blurred, &paths.blurred) {
            if let Err(e) = save_image(img, path) {
                if let Err(cleanup) = std::fs::remove_file(&paths.sharp) {
                    log::warn!(
                        "Could not remove {} after failed variant write: {}",
                        paths.sharp.display(),
                        cleanup
                    );
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Draws projections onto its own canvas.
///
/// A renderer is not shared between threads; parallel callers create one
/// renderer per worker.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    canvas: Canvas,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let canvas = Canvas::new(config.canvas_px, config.dpi);
        Ok(Self { config, canvas })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Axis limits for a shape of the given width.
    pub fn limits_for(&self, shape_width: usize) -> [f64; 2] {
        let half = shape_width as f64 / 2.0 + self.config.margin;
        [-half, half]
    }

    /// Render a projection of a shape with the given width.
    ///
    /// Speckle positions and opacities are drawn from `rng`.
    pub fn render<R: Rng + ?Sized>(
        &mut self,
        projection: &Projection,
        shape_width: usize,
        rng: &mut R,
    ) -> Result<RenderedImage, RenderError> {
        let limits = self.limits_for(shape_width);
        let config = self.config.clone();

        let raw = {
            let mut session = self.canvas.session(limits);
            if let Some(speckle) = &config.speckle {
                draw_speckle(&mut session, speckle, limits, rng)?;
            }
            for b in 0..config.layers.count {
                session.scatter(
                    projection.points(),
                    config.layers.marker_area(b),
                    config.layers.alpha(b, shape_width),
                );
            }
            session.to_rgb_image()
        };

        let sharp = crop_border(&raw, config.crop_fraction);
        let blurred = config.secondary_blur.map(|blur| {
            let img = apply_blur(&sharp, &blur);
            match config.output_size {
                Some(size) => resize_square(&img, size),
                None => img,
            }
        });

        Ok(RenderedImage { sharp, blurred })
    }

    /// Render and write in one call.
    pub fn render_to<R: Rng + ?Sized>(
        &mut self,
        projection: &Projection,
        shape_width: usize,
        paths: &OutputPaths,
        rng: &mut R,
    ) -> Result<RenderedImage, RenderError> {
        let rendered = self.render(projection, shape_width, rng)?;
        rendered.write(paths)?;
        Ok(rendered)
    }
}

fn draw_speckle<R: Rng + ?Sized>(
    session: &mut CanvasSession<'_>,
    speckle: &SpeckleConfig,
    limits: [f64; 2],
    rng: &mut R,
) -> Result<(), RenderError> {
    let poisson = Poisson::new(speckle.poisson_mean)
        .map_err(|e| RenderError::InvalidParameter(format!("speckle: {}", e)))?;
    let [lo, hi] = limits;

    let xs: Vec<f64> = (0..speckle.count).map(|_| rng.gen_range(lo..hi)).collect();
    let ys: Vec<f64> = (0..speckle.count).map(|_| rng.gen_range(lo..hi)).collect();
    let alphas: Vec<f64> = (0..speckle.count)
        .map(|_| {
            let k: f64 = poisson.sample(rng);
            SpeckleConfig::alpha(k)
        })
        .collect();
    let points: Vec<[f64; 2]> = xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect();

    session.scatter_with_alpha(&points, &alphas, speckle.marker_area);
    Ok(())
}

/// Sharp and blurred destinations for a sample, relative to a dataset root.
pub fn output_paths(root: &Path, sharp_name: &str, blurred: Option<(PathBuf, String)>) -> OutputPaths {
    OutputPaths {
        sharp: root.join(sharp_name),
        blurred: blurred.map(|(subdir, name)| root.join(subdir).join(name)),
    }
}
