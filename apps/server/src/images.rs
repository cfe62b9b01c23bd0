//! Profile picture processing.
//!
//! ```text
//! upload (png/jpg/jpeg/gif, ≤ MAX_UPLOAD_BYTES)
//!   → decode
//!   → flatten alpha onto white
//!   → center-crop to a square
//!   → resize 400×400 (Lanczos3)
//!   → JPEG q85 → {UPLOAD_DIR}/profile_{user_id}.jpg
//! ```

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use thiserror::Error;
use tracing::{debug, error};

use crate::error::ApiError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

pub const PROFILE_SIZE: u32 = 400;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No file uploaded")]
    Empty,

    #[error("File type not allowed: use png, jpg, jpeg or gif")]
    UnsupportedExtension,

    #[error("File is too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: usize },

    #[error("File is not a readable image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Encode(_) | ImageError::Io(_) => {
                error!("Profile picture processing failed: {}", err);
                ApiError::internal("Failed to save profile picture")
            }
            other => ApiError::validation(other.to_string()),
        }
    }
}

/// Checks the upload's file name and size before any decoding.
///
/// ## Returns
/// The lowercased extension.
pub fn check_upload(filename: &str, len: usize, max_bytes: usize) -> Result<String, ImageError> {
    if len == 0 {
        return Err(ImageError::Empty);
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or(ImageError::UnsupportedExtension)?;

    if len > max_bytes {
        return Err(ImageError::TooLarge { max_bytes });
    }

    Ok(extension)
}

/// Produces the stored JPEG from raw upload bytes. CPU-bound.
pub fn process_profile_image(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();

    // Transparent pixels would turn black in JPEG
    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });

    let side = flattened.width().min(flattened.height());
    let x = (flattened.width() - side) / 2;
    let y = (flattened.height() - side) / 2;
    let square = imageops::crop_imm(&flattened, x, y, side, side).to_image();

    let resized = imageops::resize(&square, PROFILE_SIZE, PROFILE_SIZE, FilterType::Lanczos3);

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&resized)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    Ok(out)
}

pub fn profile_file_name(user_id: i64) -> String {
    format!("profile_{}.jpg", user_id)
}

/// Processes an upload on the blocking pool and writes it into `dir`.
///
/// ## Returns
/// The stored file name.
pub async fn save_profile_picture(
    dir: &Path,
    user_id: i64,
    bytes: Vec<u8>,
) -> Result<String, ImageError> {
    let jpeg = tokio::task::spawn_blocking(move || process_profile_image(&bytes))
        .await
        .map_err(|e| ImageError::Encode(e.to_string()))??;

    tokio::fs::create_dir_all(dir).await?;

    let file_name = profile_file_name(user_id);
    tokio::fs::write(dir.join(&file_name), &jpeg).await?;

    debug!(user_id, bytes = jpeg.len(), file = %file_name, "Profile picture stored");
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_check_upload() {
        assert_eq!(check_upload("me.PNG", 10, 100).unwrap(), "png");
        assert_eq!(check_upload("a.b.jpeg", 10, 100).unwrap(), "jpeg");
        assert!(matches!(
            check_upload("script.exe", 10, 100),
            Err(ImageError::UnsupportedExtension)
        ));
        assert!(matches!(
            check_upload("noext", 10, 100),
            Err(ImageError::UnsupportedExtension)
        ));
        assert!(matches!(
            check_upload("big.jpg", 101, 100),
            Err(ImageError::TooLarge { max_bytes: 100 })
        ));
        assert!(matches!(check_upload("x.gif", 0, 100), Err(ImageError::Empty)));
    }

    #[test]
    fn test_transparent_wide_image_becomes_white_square() {
        let img = RgbaImage::from_pixel(300, 120, Rgba([0, 0, 0, 0]));
        let jpeg = process_profile_image(&png_bytes(&img)).unwrap();

        let out = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (PROFILE_SIZE, PROFILE_SIZE));
        let [r, g, b] = out.get_pixel(200, 200).0;
        assert!(r > 245 && g > 245 && b > 245);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = process_profile_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
        assert_eq!(
            ApiError::from(err).code,
            crate::error::ErrorCode::ValidationError
        );
    }

    #[tokio::test]
    async fn test_save_profile_picture() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(50, 80, Rgba([200, 10, 10, 255]));

        let name = save_profile_picture(dir.path(), 12, png_bytes(&img))
            .await
            .unwrap();

        assert_eq!(name, "profile_12.jpg");
        let stored = std::fs::read(dir.path().join(&name)).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
    }
}
