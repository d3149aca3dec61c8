//! # Image Analysis
//!
//! The alarm engine only consumes a yes/no answer to "is there a cat in this
//! picture?". [`ImageService`] is that contract; the detectors here are
//! stand-ins for a real label-detection backend.
//!
//! | Detector | Answer |
//! |----------|--------|
//! | [`FakeImageService`] | random, optionally seeded |
//! | [`StaticImageService`] | fixed |

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised while loading or analysing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The image file could not be read.
    #[error("cannot read image {path}: {source}")]
    Unreadable {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The image contains no data.
    #[error("image is empty")]
    Empty,

    /// The detector could not produce an answer.
    #[error("detector unavailable: {0}")]
    Unavailable(String),
}

/// An encoded camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraImage {
    bytes: Vec<u8>,
    source: Option<PathBuf>,
}

impl CameraImage {
    /// Wraps already encoded image bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            source: None,
        }
    }

    /// Reads an image file.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Unreadable` if the file cannot be read and
    /// `ImageError::Empty` if it has no content.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ImageError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        Ok(Self {
            bytes,
            source: Some(path.to_path_buf()),
        })
    }

    /// Raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File the image was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Cat detector contract.
pub trait ImageService: Send {
    /// Returns true if the image contains a cat with at least
    /// `confidence_threshold` percent confidence.
    fn image_contains_cat(
        &self,
        image: &CameraImage,
        confidence_threshold: f32,
    ) -> Result<bool, ImageError>;
}

impl<T: ImageService + ?Sized> ImageService for Box<T> {
    fn image_contains_cat(
        &self,
        image: &CameraImage,
        confidence_threshold: f32,
    ) -> Result<bool, ImageError> {
        (**self).image_contains_cat(image, confidence_threshold)
    }
}

/// Detector that guesses.
///
/// Ignores the image and the threshold and flips a coin. Seed it for
/// reproducible sessions.
#[derive(Debug)]
pub struct FakeImageService {
    rng: Mutex<StdRng>,
}

impl FakeImageService {
    /// Creates a detector seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a detector with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for FakeImageService {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageService for FakeImageService {
    fn image_contains_cat(
        &self,
        _image: &CameraImage,
        _confidence_threshold: f32,
    ) -> Result<bool, ImageError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ImageError::Unavailable("random source poisoned".to_string()))?;
        Ok(rng.random_bool(0.5))
    }
}

/// Detector with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticImageService {
    answer: bool,
}

impl StaticImageService {
    /// Creates a detector that always answers `answer`.
    pub const fn new(answer: bool) -> Self {
        Self { answer }
    }
}

impl ImageService for StaticImageService {
    fn image_contains_cat(
        &self,
        _image: &CameraImage,
        _confidence_threshold: f32,
    ) -> Result<bool, ImageError> {
        Ok(self.answer)
    }
}
