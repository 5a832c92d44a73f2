//! Image normalization ahead of OCR.
//!
//! Stages run in a fixed order: grayscale, local contrast enhancement,
//! binarization, median denoise, deskew, optional 1.5x upscale. Every stage
//! is offered to a [`StageSink`] so intermediate images can be inspected
//! without touching the algorithm.

use crate::contrast::{adaptive_threshold, equalize_local, otsu_threshold};
use crate::deskew::{rotate_replicate, skew_angle};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat};
use imageproc::filter::median_filter;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single-channel page ready for OCR.
pub type PreprocessedImage = GrayImage;

/// Preprocessing stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Original,
    Gray,
    Contrast,
    Threshold,
    Denoise,
    Deskew,
    Resized,
}

impl Stage {
    /// File stem used when a stage is written to disk.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Stage::Original => "original",
            Stage::Gray => "gray",
            Stage::Contrast => "clahe",
            Stage::Threshold => "threshold",
            Stage::Denoise => "denoise",
            Stage::Deskew => "deskew",
            Stage::Resized => "resized",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Receives intermediate images. Purely observational: nothing a sink does
/// changes the preprocessing result.
pub trait StageSink {
    /// Whether the sink wants images at all. Lets the pipeline skip copies.
    fn enabled(&self) -> bool {
        true
    }

    /// Record the image produced by a stage.
    fn record(&self, stage: Stage, image: &DynamicImage);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl StageSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&self, _stage: Stage, _image: &DynamicImage) {}
}

/// Sink that writes each stage as `<stage>.png` into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing into `dir`. The directory is created on first
    /// use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StageSink for DirectorySink {
    fn record(&self, stage: Stage, image: &DynamicImage) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            log::warn!("Cannot create debug directory {}: {}", self.dir.display(), e);
            return;
        }
        let path = self.dir.join(format!("{}.png", stage.file_stem()));
        if let Err(e) = image.save_with_format(&path, ImageFormat::Png) {
            log::warn!("Failed to write {} stage to {}: {}", stage, path.display(), e);
        }
    }
}

/// Binarization method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binarization {
    /// Gaussian-weighted local mean threshold.
    Adaptive { block_size: u32, bias: i32 },
    /// Global Otsu threshold with dark-background inversion.
    Otsu,
}

impl Default for Binarization {
    fn default() -> Self {
        Binarization::Adaptive {
            block_size: 11,
            bias: 2,
        }
    }
}

/// Preprocessing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Tiles per side for local contrast enhancement.
    pub tile_grid: u32,
    /// Histogram clip limit for local contrast enhancement.
    pub clip_limit: f32,
    /// Binarization method.
    pub binarization: Binarization,
    /// Median filter radius; 1 gives a 3x3 window.
    pub median_radius: u32,
    /// Whether to upscale the final image.
    pub enlarge: bool,
    /// Upscale factor applied when `enlarge` is set.
    pub scale: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            tile_grid: 8,
            clip_limit: 3.0,
            binarization: Binarization::default(),
            median_radius: 1,
            enlarge: true,
            scale: 1.5,
        }
    }
}

impl PreprocessConfig {
    /// Set whether to upscale the result.
    pub fn with_enlarge(mut self, enlarge: bool) -> Self {
        self.enlarge = enlarge;
        self
    }

    /// Set the binarization method.
    pub fn with_binarization(mut self, binarization: Binarization) -> Self {
        self.binarization = binarization;
        self
    }
}

/// Normalizes raw images for OCR.
pub struct Preprocessor {
    config: PreprocessConfig,
    sink: Box<dyn StageSink>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("config", &self.config)
            .field("sink_enabled", &self.sink.enabled())
            .finish()
    }
}

impl Preprocessor {
    /// Create a preprocessor that records nothing.
    pub fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            sink: Box::new(NoopSink),
        }
    }

    /// Send intermediate stages to a sink.
    pub fn with_sink(mut self, sink: Box<dyn StageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Run every stage and return the OCR-ready page.
    pub fn preprocess(&self, image: &DynamicImage) -> PreprocessedImage {
        let config = &self.config;
        self.record(Stage::Original, || DynamicImage::ImageRgb8(image.to_rgb8()));

        let gray = image.to_luma8();
        self.record_gray(Stage::Gray, &gray);

        let enhanced = equalize_local(&gray, config.tile_grid, config.clip_limit);
        self.record_gray(Stage::Contrast, &enhanced);

        let binary = match config.binarization {
            Binarization::Adaptive { block_size, bias } => {
                adaptive_threshold(&enhanced, block_size, bias)
            }
            Binarization::Otsu => otsu_threshold(&enhanced),
        };
        self.record_gray(Stage::Threshold, &binary);

        let denoised = median_filter(&binary, config.median_radius, config.median_radius);
        self.record_gray(Stage::Denoise, &denoised);

        let angle = skew_angle(&denoised);
        log::debug!("Estimated skew correction: {:.2} degrees", angle);
        let deskewed = rotate_replicate(&denoised, angle);
        self.record_gray(Stage::Deskew, &deskewed);

        if !config.enlarge {
            return deskewed;
        }

        let width = ((deskewed.width() as f32) * config.scale) as u32;
        let height = ((deskewed.height() as f32) * config.scale) as u32;
        if width == 0 || height == 0 {
            return deskewed;
        }
        let resized = imageops::resize(&deskewed, width, height, FilterType::CatmullRom);
        self.record_gray(Stage::Resized, &resized);
        resized
    }

    fn record(&self, stage: Stage, image: impl FnOnce() -> DynamicImage) {
        if self.sink.enabled() {
            self.sink.record(stage, &image());
        }
    }

    fn record_gray(&self, stage: Stage, image: &GrayImage) {
        self.record(stage, || DynamicImage::ImageLuma8(image.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct RecordingSink {
        stages: Rc<RefCell<Vec<Stage>>>,
    }

    impl StageSink for RecordingSink {
        fn record(&self, stage: Stage, _image: &DynamicImage) {
            self.stages.borrow_mut().push(stage);
        }
    }

    fn sample_page() -> DynamicImage {
        let mut img = RgbImage::from_pixel(40, 30, Rgb([235, 235, 230]));
        for y in 12..16 {
            for x in 5..35 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_output_is_binary_and_enlarged() {
        let pre = Preprocessor::default();
        let out = pre.preprocess(&sample_page());
        assert_eq!(out.dimensions(), (60, 45));
    }

    #[test]
    fn test_without_enlarge_keeps_size() {
        let pre = Preprocessor::new(PreprocessConfig::default().with_enlarge(false));
        let out = pre.preprocess(&sample_page());
        assert_eq!(out.dimensions(), (40, 30));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_blank_page_stays_white() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([250])));
        let pre = Preprocessor::new(PreprocessConfig::default().with_enlarge(false));
        let out = pre.preprocess(&blank);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_otsu_mode_runs() {
        let config = PreprocessConfig::default()
            .with_binarization(Binarization::Otsu)
            .with_enlarge(false);
        let out = Preprocessor::new(config).preprocess(&sample_page());
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_sink_sees_every_stage_in_order() {
        let sink = RecordingSink::default();
        let pre = Preprocessor::default().with_sink(Box::new(sink.clone()));
        pre.preprocess(&sample_page());

        assert_eq!(
            *sink.stages.borrow(),
            vec![
                Stage::Original,
                Stage::Gray,
                Stage::Contrast,
                Stage::Threshold,
                Stage::Denoise,
                Stage::Deskew,
                Stage::Resized,
            ]
        );
    }

    #[test]
    fn test_sink_does_not_change_result() {
        let plain = Preprocessor::default().preprocess(&sample_page());
        let observed = Preprocessor::default()
            .with_sink(Box::new(RecordingSink::default()))
            .preprocess(&sample_page());
        assert_eq!(plain, observed);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("debug"));
        let pre = Preprocessor::default().with_sink(Box::new(sink));
        pre.preprocess(&sample_page());

        for stem in ["original", "gray", "clahe", "threshold", "denoise", "deskew", "resized"] {
            assert!(
                dir.path().join("debug").join(format!("{}.png", stem)).exists(),
                "missing {}",
                stem
            );
        }
    }

    #[test]
    fn test_stage_file_stems() {
        assert_eq!(Stage::Contrast.file_stem(), "clahe");
        assert_eq!(Stage::Resized.to_string(), "resized");
    }
}
