//! Image loading and the two processed variants used in popups: `resized` and `circled`.

use std::fs;
use std::path::PathBuf;

use ::image::imageops::FilterType;
use ::image::{DynamicImage, GrayAlphaImage, ImageFormat, LumaA};
use tracing::info;

use super::{split_file_name, MediaKind, MediaRef};
use crate::config::Paths;
use crate::data::dataset::State;
use crate::error::{Error, Result};

pub const DEFAULT_SIZE: (u32, u32) = (200, 200);
pub const RESIZED_STATE: &str = "resized";
pub const CIRCLED_STATE: &str = "circled";

#[derive(Debug, Clone)]
pub struct ImageHandler {
    media: MediaRef,
    image: Option<DynamicImage>,
}

impl ImageHandler {
    pub fn new(
        name: &str,
        extension: &str,
        category: Option<&str>,
        state: State,
        paths: &Paths,
    ) -> ImageHandler {
        ImageHandler {
            media: MediaRef::new(MediaKind::Image, name, extension, category, state, paths),
            image: None,
        }
    }

    pub fn from_ref(media: MediaRef) -> ImageHandler {
        ImageHandler { media, image: None }
    }

    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.media.resolve()
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn load(&mut self) -> Result<()> {
        let path = self.media.existing_path()?;
        self.image = Some(::image::open(&path)?);
        Ok(())
    }

    fn loaded(&self) -> Result<&DynamicImage> {
        self.image.as_ref().ok_or_else(|| {
            Error::MediaNotFound(format!("{}.{} is not loaded", self.media.name(), self.media.extension()))
        })
    }

    /// Write to the path of the current state, in the format implied by the extension.
    pub fn save(&self) -> Result<PathBuf> {
        let image = self.loaded()?;
        let path = self.media.resolve().ok_or_else(|| {
            Error::InvalidTarget(self.media.state().clone())
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        if self.media.extension().eq_ignore_ascii_case("jpeg") || self.media.extension().eq_ignore_ascii_case("jpg") {
            image.save_with_format(&path, ImageFormat::Jpeg)?;
        } else {
            image.save(&path)?;
        }
        info!(path = %path.display(), "saved image");
        Ok(path)
    }

    /// Shrink to fit within `max_width` × `max_height` keeping the aspect ratio, then go grayscale.
    pub fn resize(&mut self, max_width: u32, max_height: u32) -> Result<()> {
        let shrunk = shrink_gray(self.loaded()?, max_width, max_height);
        self.image = Some(shrunk);
        self.media.set_state(State::named(RESIZED_STATE));
        Ok(())
    }

    /// Shrink + grayscale, fill exactly `width` × `height` around the center, and make
    /// everything outside the inscribed ellipse transparent.
    pub fn circle(&mut self, width: u32, height: u32) -> Result<()> {
        let shrunk = shrink_gray(self.loaded()?, width, height);
        let fitted = shrunk
            .resize_to_fill(width, height, FilterType::Lanczos3)
            .to_luma_alpha8();
        self.image = Some(DynamicImage::ImageLumaA8(apply_circle_mask(fitted)));
        self.media.set_state(State::named(CIRCLED_STATE));
        Ok(())
    }

    pub fn set_extension(&mut self, extension: &str) {
        self.media.set_extension(extension);
    }

    pub fn encoded_base64(&self) -> Result<String> {
        self.media.encoded_base64()
    }

    pub fn data_uri(&self) -> Result<String> {
        self.media.data_uri()
    }
}

fn shrink_gray(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let shrunk = if image.width() > max_width || image.height() > max_height {
        image.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        image.clone()
    };
    shrunk.grayscale()
}

fn apply_circle_mask(mut image: GrayAlphaImage) -> GrayAlphaImage {
    let (width, height) = image.dimensions();
    let (rx, ry) = (width as f64 / 2.0, height as f64 / 2.0);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = (x as f64 + 0.5 - rx) / rx;
        let dy = (y as f64 + 0.5 - ry) / ry;
        let alpha = if dx * dx + dy * dy <= 1.0 { 255 } else { 0 };
        *pixel = LumaA([pixel[0], alpha]);
    }
    image
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOperation {
    Resize,
    Circle,
}

/// Process every raw image (no category) and save it under the operation's state.
/// Hidden files such as `.gitkeep` are skipped. Returns the processed count.
pub fn process_raw_images(paths: &Paths, operation: ImageOperation, size: (u32, u32)) -> Result<usize> {
    let dir = &paths.raw_images;
    let mut files: Vec<String> = fs::read_dir(dir)
        .map_err(|err| Error::io(dir, err))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    files.sort();

    let mut processed = 0;
    for file in files {
        let Some((name, extension)) = split_file_name(&file) else {
            continue;
        };
        let mut handler = ImageHandler::new(name, extension, None, State::Raw, paths);
        handler.load()?;
        match operation {
            ImageOperation::Resize => handler.resize(size.0, size.1)?,
            ImageOperation::Circle => {
                handler.circle(size.0, size.1)?;
                // Alpha needs a format that carries it.
                handler.set_extension("png");
            }
        }
        handler.save()?;
        processed += 1;
    }
    Ok(processed)
}
