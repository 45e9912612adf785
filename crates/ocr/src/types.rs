use std::io::Cursor;
use std::path::Path;

/// A caller-supplied photo of (part of) a bill, still in its encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl RawImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }

    /// Wrap bytes, sniffing the mime type from the content. Unrecognized
    /// content is labelled `application/octet-stream` and will fail to decode
    /// later rather than here.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = image::guess_format(&data)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Self::new(data, mime_type)
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    /// Width and height read from the encoded header, without decoding pixels.
    pub fn dimensions(&self) -> Result<(u32, u32), image::ImageError> {
        image::ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .into_dimensions()
    }
}

/// The filtered, re-encoded form of a [`RawImage`]. Same dimensions as the
/// source; lives only for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub mime_type: &'static str,
}
