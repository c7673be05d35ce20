//! Format converters: canvas → data URL, data URL → blob.
//!
//! Image decoding from a data URL lives with the loader
//! ([`crate::loader::create_image`]) since it shares the decode path.

use crate::canvas::Canvas;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as Base64Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Encoding used when serializing a canvas (`toDataURL(type, quality)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    /// Lossy JPEG; `quality` is 1..=100. Alpha is dropped.
    Jpeg { quality: u8 },
    Bmp,
    /// Lossless WebP
    Webp,
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn validate(self) -> Result<()> {
        match self {
            OutputFormat::Jpeg { quality } if !(1..=100).contains(&quality) => Err(
                Error::ConfigError(format!("JPEG quality must be 1..=100, got {}", quality)),
            ),
            _ => Ok(()),
        }
    }
}

/// A parsed `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime: String,
    base64: bool,
    payload: Vec<u8>,
}

const DEFAULT_MIME: &str = "text/plain;charset=US-ASCII";

/// What a zero-sized canvas serializes to, as `toDataURL()` does
pub const EMPTY_DATA_URL: &str = "data:,";

impl DataUrl {
    /// Build a base64 data URL around already-encoded bytes
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            base64: true,
            payload: bytes,
        }
    }

    /// Parse `data:[<mediatype>][;base64],<data>`
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix("data:")
            .ok_or_else(|| Error::ConversionError("not a data URL".into()))?;
        let (meta, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::ConversionError("data URL has no ',' separator".into()))?;

        let (media, base64) = match meta.rsplit_once(';') {
            Some((m, token)) if token.trim().eq_ignore_ascii_case("base64") => (m, true),
            _ => (meta, false),
        };
        let mime = if media.is_empty() {
            DEFAULT_MIME.to_string()
        } else {
            media.to_ascii_lowercase()
        };

        let payload = if base64 {
            // Browsers tolerate whitespace inside the payload
            let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD.decode(compact.as_bytes())?
        } else {
            percent_decode(data)?
        };

        Ok(Self {
            mime,
            base64,
            payload,
        })
    }

    /// Media type without parameters, e.g. `image/png`
    pub fn mime(&self) -> &str {
        self.mime.split(';').next().unwrap_or(&self.mime).trim()
    }

    pub fn is_base64(&self) -> bool {
        self.base64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, STANDARD.encode(&self.payload))
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::ConversionError(format!("bad percent escape at {}", i)))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Binary contents decoded from a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    mime: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// MIME type, e.g. `image/png`
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode the raw bytes of a canvas in `format`.
///
/// A canvas with no pixels has no encoding and is a `ConversionError`.
pub fn encode(canvas: &Canvas, format: OutputFormat) -> Result<Vec<u8>> {
    format.validate()?;
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(Error::ConversionError(format!(
            "cannot encode a {}x{} canvas",
            canvas.width(),
            canvas.height()
        )));
    }
    let image = DynamicImage::ImageRgba8(canvas.clone().into_rgba());
    let mut buf = Vec::new();
    let written = match format {
        OutputFormat::Png => image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
        OutputFormat::Bmp => image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp),
        OutputFormat::Webp => image.write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP),
        OutputFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        }
    };
    written.map_err(|e| Error::ConversionError(format!("{} encoding failed: {}", format.mime(), e)))?;
    Ok(buf)
}

/// Serialize a canvas to a `data:<mime>;base64,...` string.
///
/// A zero-sized canvas yields [`EMPTY_DATA_URL`].
pub fn data_url(canvas: &Canvas, format: OutputFormat) -> Result<String> {
    format.validate()?;
    if canvas.width() == 0 || canvas.height() == 0 {
        return Ok(EMPTY_DATA_URL.to_string());
    }
    let bytes = encode(canvas, format)?;
    Ok(DataUrl::new(format.mime(), bytes).to_string())
}

/// Decode a data URL into a [`Blob`]
pub async fn blob(data_url: String) -> Result<Blob> {
    tokio::task::spawn_blocking(move || -> Result<Blob> {
        let parsed = DataUrl::parse(&data_url)?;
        let mime = parsed.mime().to_string();
        Ok(Blob::new(parsed.into_bytes(), mime))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_urls() {
        let d = DataUrl::parse("data:image/png;base64,AAEC").unwrap();
        assert_eq!(d.mime(), "image/png");
        assert!(d.is_base64());
        assert_eq!(d.bytes(), &[0, 1, 2]);
    }

    #[test]
    fn base64_token_ignores_case() {
        let d = DataUrl::parse("data:image/png;BASE64,AAEC").unwrap();
        assert!(d.is_base64());
        assert_eq!(d.mime(), "image/png");
        assert_eq!(d.bytes(), &[0, 1, 2]);
        let d = DataUrl::parse("data:image/png;Base64,AAEC").unwrap();
        assert_eq!(d.bytes(), &[0, 1, 2]);
    }

    #[test]
    fn parses_percent_encoded_urls_with_default_mime() {
        let d = DataUrl::parse("data:,Hello%2C%20World").unwrap();
        assert_eq!(d.mime(), "text/plain");
        assert_eq!(d.bytes(), b"Hello, World");
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(matches!(DataUrl::parse("http://x"), Err(Error::ConversionError(_))));
        assert!(matches!(DataUrl::parse("data:image/png;base64"), Err(Error::ConversionError(_))));
        assert!(matches!(DataUrl::parse("data:image/png;base64,@@@"), Err(Error::ConversionError(_))));
        assert!(matches!(DataUrl::parse("data:,%zz"), Err(Error::ConversionError(_))));
    }

    #[test]
    fn png_data_url_has_prefix_and_signature() {
        let url = data_url(&Canvas::new(3, 2), OutputFormat::Png).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(&parsed.bytes()[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn jpeg_quality_is_validated() {
        let canvas = Canvas::new(2, 2);
        assert!(matches!(
            data_url(&canvas, OutputFormat::Jpeg { quality: 0 }),
            Err(Error::ConfigError(_))
        ));
        let url = data_url(&canvas, OutputFormat::Jpeg { quality: 80 }).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn zero_sized_canvas_serializes_to_empty_data_url() {
        for canvas in [Canvas::new(0, 0), Canvas::new(0, 4), Canvas::new(4, 0)] {
            assert_eq!(data_url(&canvas, OutputFormat::Png).unwrap(), EMPTY_DATA_URL);
            assert!(matches!(
                encode(&canvas, OutputFormat::Png),
                Err(Error::ConversionError(_))
            ));
        }
        assert!(matches!(
            data_url(&Canvas::new(0, 0), OutputFormat::Jpeg { quality: 0 }),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn output_format_serde_shape() {
        let json = serde_json::to_string(&OutputFormat::Jpeg { quality: 90 }).unwrap();
        assert_eq!(json, r#"{"type":"jpeg","quality":90}"#);
        let png: OutputFormat = serde_json::from_str(r#"{"type":"png"}"#).unwrap();
        assert_eq!(png, OutputFormat::Png);
    }

    #[tokio::test]
    async fn blob_carries_bytes_and_mime() {
        let b = blob("data:image/png;base64,AAEC".to_string()).await.unwrap();
        assert_eq!(b.mime(), "image/png");
        assert_eq!(b.len(), 3);
    }

    #[tokio::test]
    async fn empty_data_url_becomes_an_empty_blob() {
        let b = blob(EMPTY_DATA_URL.to_string()).await.unwrap();
        assert!(b.is_empty());
        assert_eq!(b.mime(), "text/plain");
    }

    #[tokio::test]
    async fn blob_fails_on_malformed_url() {
        let err = blob("nope".to_string()).await.unwrap_err();
        assert!(matches!(err, Error::ConversionError(_)));
    }
}
