use std::fmt;

use crate::error::AppError;

/// Bounding box the preview is scaled into (width, height)
pub const MAX_SIZE: (u32, u32) = (320, 180);

/// Decoded RGBA pixels ready to be uploaded as a texture.
#[derive(Clone, PartialEq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbnail({}x{})", self.width, self.height)
    }
}

/// Downloads the image at `url` and decodes it off the async workers.
pub async fn fetch_thumbnail(url: String) -> Result<Thumbnail, AppError> {
    tokio::task::spawn_blocking(move || {
        tracing::debug!(%url, "fetching thumbnail");
        // Perform a blocking HTTP GET request; non-2xx is treated as a failure
        let bytes = reqwest::blocking::get(&url)?.error_for_status()?.bytes()?;
        decode_thumbnail(&bytes)
    })
    .await?
}

/// Decodes image bytes and shrinks them to fit within [`MAX_SIZE`], keeping the aspect ratio.
pub fn decode_thumbnail(bytes: &[u8]) -> Result<Thumbnail, AppError> {
    let mut img = image::load_from_memory(bytes)?;
    let (max_w, max_h) = MAX_SIZE;
    // `thumbnail` would also enlarge small images
    if img.width() > max_w || img.height() > max_h {
        img = img.thumbnail(max_w, max_h);
    }
    let rgba = img.to_rgba8();
    Ok(Thumbnail {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
