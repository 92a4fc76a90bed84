use std::path::Path;

use image::{DynamicImage, ImageReader};
use tracing::debug;

/// Decodes one downloaded file into a page.
///
/// `None` for files that do not decode and for images no taller than
/// `min_height`. The format is sniffed from content, not from the name.
/// A partially received file counts as one that does not decode.
pub fn load_page(path: &Path, min_height: u32) -> Option<DynamicImage> {
    let img = match ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode())
    {
        Ok(img) => img,
        Err(e) => {
            debug!(path = %path.display(), "not an image: {}", e);
            return None;
        }
    };

    if img.height() <= min_height {
        debug!(
            path = %path.display(),
            height = img.height(),
            "page too short, skipped"
        );
        return None;
    }
    Some(normalize(img))
}

/// Drops alpha and narrows to 8-bit gray or RGB, the two layouts a page can
/// be embedded with.
pub fn normalize(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma8(img.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}
