//! Contrast enhancement and binarization of grayscale pages.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;

/// Number of intensity bins.
const BINS: usize = 256;

/// Intensity midpoint used to tell dark frames from light ones.
const MIDPOINT: f32 = 128.0;

/// Tile-wise histogram equalization with a clip limit (CLAHE).
///
/// The image is split into a `grid` x `grid` set of tiles. Each tile's
/// histogram is clipped at `clip_limit * tile_area / 256`, the excess is
/// spread evenly over all bins, and the resulting mapping is bilinearly
/// interpolated between neighbouring tile centres.
pub fn equalize_local(image: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
            let v = image.get_pixel(x, y)[0] as usize;

            let top = lut_at(tx0, ty0)[v] * (1.0 - wx) + lut_at(tx1, ty0)[v] * wx;
            let bottom = lut_at(tx0, ty1)[v] * (1.0 - wx) + lut_at(tx1, ty1)[v] * wx;
            let value = top * (1.0 - wy) + bottom * wy;

            out.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }

    out
}

/// Clipped-histogram equalization mapping for one tile.
fn tile_lut(image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [f32; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let area = ((x1 - x0) * (y1 - y0)).max(1);

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for count in hist.iter_mut() {
            if *count > limit {
                excess += *count - limit;
                *count = limit;
            }
        }

        let per_bin = excess / BINS as u32;
        let residual = (excess % BINS as u32) as usize;
        for count in hist.iter_mut() {
            *count += per_bin;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for idx in (0..BINS).step_by(step).take(residual) {
                hist[idx] += 1;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0f32; BINS];
    let mut cumulative = 0u32;
    for (idx, count) in hist.iter().enumerate() {
        cumulative += count;
        lut[idx] = (cumulative as f32 * scale).min(255.0);
    }
    lut
}

/// The two tiles whose centres surround `pos` along one axis, and the
/// weight of the second.
fn neighbours(pos: u32, tile: u32, tiles: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let lo = f.floor() as u32;
    if lo + 1 >= tiles {
        return (tiles - 1, tiles - 1, 0.0);
    }
    (lo, lo + 1, f - lo as f32)
}

/// Gaussian-weighted adaptive threshold.
///
/// A pixel becomes white when it is brighter than its neighbourhood mean
/// minus `bias`, black otherwise. `block_size` sets the Gaussian spread the
/// same way an odd square window would.
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, bias: i32) -> GrayImage {
    let sigma = gaussian_sigma(block_size);
    let mean = gaussian_blur_f32(image, sigma);

    let mut out = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let local = mean.get_pixel(x, y)[0] as i32;
        let value = if pixel[0] as i32 > local - bias { 255 } else { 0 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}

/// Sigma matching a square Gaussian window of `block_size` pixels.
fn gaussian_sigma(block_size: u32) -> f32 {
    let block = block_size.max(3) as f32;
    (0.3 * ((block - 1.0) * 0.5 - 1.0) + 0.8).max(0.5)
}

/// Global Otsu threshold. Dark-background frames are inverted so the
/// result is always dark ink on a white page.
pub fn otsu_threshold(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    let dark = is_dark_background(image);
    log::debug!("Otsu level {}, dark background: {}", level, dark);

    let mut out = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let bright = pixel[0] > level;
        let white = bright != dark;
        out.put_pixel(x, y, Luma([if white { 255 } else { 0 }]));
    }
    out
}

/// Mean intensity of the four corner regions, each a square one tenth of
/// the shorter side.
pub fn corner_mean(image: &GrayImage) -> f32 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let side = (width.min(height) / 10).max(1);
    let origins = [
        (0, 0),
        (width - side, 0),
        (0, height - side),
        (width - side, height - side),
    ];

    let mut sum = 0u64;
    let mut count = 0u64;
    for (ox, oy) in origins {
        for y in oy..oy + side {
            for x in ox..ox + side {
                sum += image.get_pixel(x, y)[0] as u64;
                count += 1;
            }
        }
    }

    sum as f32 / count as f32
}

/// True when the corners are darker than the intensity midpoint.
pub fn is_dark_background(image: &GrayImage) -> bool {
    corner_mean(image) < MIDPOINT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_box(bg: u8, fg: u8) -> GrayImage {
        let mut img = GrayImage::from_pixel(60, 40, Luma([bg]));
        for y in 15..25 {
            for x in 20..40 {
                img.put_pixel(x, y, Luma([fg]));
            }
        }
        img
    }

    #[test]
    fn test_equalize_local_keeps_dimensions() {
        let img = page_with_box(200, 40);
        let out = equalize_local(&img, 8, 3.0);
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn test_equalize_local_tiny_image() {
        let img = GrayImage::from_pixel(3, 2, Luma([90]));
        let out = equalize_local(&img, 8, 3.0);
        assert_eq!(out.dimensions(), (3, 2));

        let empty = GrayImage::new(0, 0);
        assert_eq!(equalize_local(&empty, 8, 3.0).dimensions(), (0, 0));
    }

    #[test]
    fn test_equalize_local_stretches_low_contrast() {
        let mut img = GrayImage::new(64, 64);
        for (x, _, p) in img.enumerate_pixels_mut() {
            *p = Luma([100 + (x % 2) as u8 * 20]);
        }
        let out = equalize_local(&img, 8, 40.0);
        let min = out.pixels().map(|p| p[0]).min().unwrap();
        let max = out.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 20, "contrast not increased: {}..{}", min, max);
    }

    #[test]
    fn test_neighbours() {
        assert_eq!(neighbours(0, 10, 4), (0, 0, 0.0));
        assert_eq!(neighbours(39, 10, 4), (3, 3, 0.0));
        let (lo, hi, w) = neighbours(10, 10, 4);
        assert_eq!((lo, hi), (0, 1));
        assert!((w - 0.55).abs() < 1e-5);
    }

    #[test]
    fn test_adaptive_threshold_is_binary() {
        let img = page_with_box(220, 30);
        let out = adaptive_threshold(&img, 11, 2);
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // Flat background stays white
        assert_eq!(out.get_pixel(2, 2)[0], 255);
        // Edge of the dark box turns black
        assert_eq!(out.get_pixel(20, 20)[0], 0);
    }

    #[test]
    fn test_otsu_light_page() {
        let img = page_with_box(230, 20);
        let out = otsu_threshold(&img);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(30, 20)[0], 0);
    }

    #[test]
    fn test_otsu_dark_page_inverted() {
        let img = page_with_box(20, 230);
        assert!(is_dark_background(&img));
        let out = otsu_threshold(&img);
        // Background becomes white, bright text becomes black ink
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(30, 20)[0], 0);
    }

    #[test]
    fn test_corner_mean() {
        let img = GrayImage::from_pixel(20, 20, Luma([100]));
        assert!((corner_mean(&img) - 100.0).abs() < f32::EPSILON);
        assert!(!is_dark_background(&GrayImage::from_pixel(5, 5, Luma([200]))));
    }
}
