//! Watermark
//!
//! Composite one or more images onto a canvas with a caller-supplied draw
//! function and export the result as a data URL, a binary blob or a new
//! image.
//!
//! # Features
//!
//! - **Mixed resources**: URLs (`http(s)://`, `data:`, `file://`, plain
//!   paths) and in-memory file objects in one list
//! - **Immutable façade**: every conversion returns a new [`Watermark`]
//! - **Position helpers**: corner, centre and tiling coordinates for draw
//!   functions, plus ready-made [`stamp`] draw functions
//!
//! # Example
//!
//! ```no_run
//! use watermark::{position::Placement, stamp, watermark};
//!
//! # async fn run() -> watermark::Result<()> {
//! let blob = watermark(["photo.jpg", "https://example.com/logo.png"])
//!     .blob(stamp::image(Placement::LowerRight, 0.5))
//!     .await?;
//! std::fs::write("out.png", blob.as_bytes()).ok();
//! # Ok(())
//! # }
//! ```
//!
//! All chains run on tokio; create façades from inside a runtime to have
//! them start immediately.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod canvas;
pub mod convert;
pub mod draw;
pub mod facade;
pub mod loader;
pub mod position;
pub mod resource;
pub mod stamp;

pub use canvas::{map_to_canvas, Canvas, ImageSource};
pub use convert::{Blob, DataUrl, OutputFormat};
pub use draw::{DrawFn, IntoComposite};
pub use facade::{watermark, Watermark};
pub use loader::{create_image, load, ImageInit, ImageRequest, LoadedImage};
pub use resource::{FileBlob, Resource};

/// Configuration for loading and encoding
///
/// The defaults mirror what a browser would do: PNG output, a 30 second
/// fetch timeout and no extra headers.
///
/// # Examples
///
/// ```
/// let cfg = watermark::WatermarkConfig::default();
/// assert_eq!(cfg.format, watermark::OutputFormat::Png);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// User agent string sent with HTTP requests
    pub user_agent: String,
    /// Timeout for HTTP loads in milliseconds
    pub timeout_ms: u64,
    /// Headers sent with every HTTP request
    pub headers: HashMap<String, String>,
    /// Encoding used by `data_url` (and therefore `blob`/`image`)
    pub format: OutputFormat,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("watermark/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30000,
            headers: HashMap::new(),
            format: OutputFormat::Png,
        }
    }
}

impl WatermarkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be positive".into()));
        }
        self.format.validate()
    }
}
