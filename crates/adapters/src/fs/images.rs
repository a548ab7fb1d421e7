use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use novellog_application::ApplicationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUriInfo {
    pub mime: String,
    pub byte_len: usize,
}

/// Reads an image file and returns it as a `data:` URI for an entry.
pub fn encode_image_file(path: &Path) -> Result<String, ApplicationError> {
    let bytes = fs::read(path).map_err(|error| {
        ApplicationError::Io(format!("failed to read {}: {error}", path.display()))
    })?;
    encode_image_bytes(&bytes)
        .map_err(|error| ApplicationError::Decode(format!("{}: {error}", path.display())))
}

fn encode_image_bytes(bytes: &[u8]) -> Result<String, String> {
    let format = image::guess_format(bytes).map_err(|error| error.to_string())?;
    let mime = mime_for(format).ok_or_else(|| format!("unsupported image format {format:?}"))?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// Mime type and decoded size of a base64 `data:` URI, if it is one.
pub fn describe_data_uri(uri: &str) -> Option<DataUriInfo> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let decoded = STANDARD.decode(payload.trim()).ok()?;
    Some(DataUriInfo {
        mime: mime.to_string(),
        byte_len: decoded.len(),
    })
}
