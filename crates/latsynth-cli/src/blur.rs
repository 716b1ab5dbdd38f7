//! Batch box blur over an existing image tree.
//!
//! Every PNG directly inside each sub-folder of the root is box-blurred once
//! per kernel size and written to `<folder>/Blurred/{stem}_Bn{k}.png`.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use latsynth_render::export::save_image;
use latsynth_render::raster::box_blur;

const BLURRED_DIR: &str = "Blurred";

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn is_png(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Blur every image below `root`. Returns the number of files written.
pub fn blur_tree(root: &Path, kernels: RangeInclusive<u32>) -> Result<usize> {
    if kernels.is_empty() {
        anyhow::bail!("Empty kernel range {}..={}", kernels.start(), kernels.end());
    }
    let mut written = 0;

    for folder in sorted_entries(root)? {
        if !folder.is_dir() || folder.file_name().is_some_and(|n| n == BLURRED_DIR) {
            continue;
        }
        let out_dir = folder.join(BLURRED_DIR);
        let images: Vec<PathBuf> = sorted_entries(&folder)?.into_iter().filter(|p| is_png(p)).collect();
        println!("Blurring {} images in {}", images.len(), folder.display());

        for path in images {
            let img = image::open(&path)
                .with_context(|| format!("Cannot read image '{}'", path.display()))?
                .to_rgb8();
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            for k in kernels.clone() {
                let target = out_dir.join(format!("{}_Bn{}.png", stem, k));
                save_image(&box_blur(&img, k), &target)?;
                log::debug!("Blurred {} (k={}) -> {}", path.display(), k, target.display());
                written += 1;
            }
        }
    }
    Ok(written)
}
