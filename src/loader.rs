//! Resource loading: turns URLs and file objects into decoded images.

use crate::canvas::ImageSource;
use crate::convert::DataUrl;
use crate::resource::{FileBlob, Resource};
use crate::{Error, Result, WatermarkConfig};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use image::{ImageFormat, RgbaImage};
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "http")]
use std::time::Duration;

/// Callback run on every URL image request before it is fetched.
///
/// This is where callers adjust request attributes (headers, timeout,
/// user agent), the way a browser caller would set `crossOrigin` on an
/// `Image` before assigning `src`. File resources never reach it.
pub type ImageInit = Arc<dyn Fn(&mut ImageRequest) + Send + Sync>;

/// A decoded image with known pixel dimensions. Cheap to clone.
#[derive(Clone)]
pub struct LoadedImage {
    pixels: Arc<RgbaImage>,
    source: Arc<str>,
}

impl LoadedImage {
    pub fn new(pixels: RgbaImage, source: impl Into<Arc<str>>) -> Self {
        Self {
            pixels: Arc::new(pixels),
            source: source.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Where the image came from (URL, file name or `data: URL`)
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl ImageSource for LoadedImage {
    fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("source", &self.source)
            .finish()
    }
}

/// The not-yet-loaded image handle passed to [`ImageInit`].
#[derive(Debug, Clone)]
pub struct ImageRequest {
    url: String,
    /// Extra request headers (HTTP only)
    pub headers: HashMap<String, String>,
    /// Per-request timeout override in milliseconds (HTTP only)
    pub timeout_ms: Option<u64>,
    /// Per-request user agent override (HTTP only)
    pub user_agent: Option<String>,
}

impl ImageRequest {
    fn new(url: &str, config: &WatermarkConfig) -> Self {
        Self {
            url: url.to_string(),
            headers: config.headers.clone(),
            timeout_ms: None,
            user_agent: None,
        }
    }

    /// The URL that will be assigned as the image source
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Where a URL string points.
#[derive(Debug, PartialEq, Eq)]
enum Location {
    Data,
    Http,
    File(PathBuf),
}

fn locate(raw: &str) -> Result<Location> {
    if raw.starts_with("data:") {
        return Ok(Location::Data);
    }
    match url::Url::parse(raw) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Ok(Location::Http),
            "file" => parsed
                .to_file_path()
                .map(Location::File)
                .map_err(|_| Error::LoadError(format!("invalid file URL: {}", raw))),
            // Drive letters (`C:\img.png`) parse as one-letter schemes
            s if s.len() == 1 => Ok(Location::File(PathBuf::from(raw))),
            other => Err(Error::LoadError(format!(
                "unsupported URL scheme '{}' in {}",
                other, raw
            ))),
        },
        Err(_) => Ok(Location::File(PathBuf::from(raw))),
    }
}

/// Fetches and decodes resources according to a [`WatermarkConfig`].
pub struct Loader {
    config: WatermarkConfig,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl Loader {
    pub fn new(config: &WatermarkConfig) -> Result<Self> {
        #[cfg(feature = "http")]
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: config.clone(),
            #[cfg(feature = "http")]
            client,
        })
    }

    /// Load every resource concurrently. The output has the same length and
    /// order as `resources`; the first failure fails the whole load.
    pub async fn load_all(
        &self,
        resources: &[Resource],
        init: Option<&ImageInit>,
    ) -> Result<Vec<LoadedImage>> {
        let pending: Vec<BoxFuture<'_, Result<LoadedImage>>> = resources
            .iter()
            .map(|resource| match resource {
                Resource::Url(url) => {
                    let mut request = ImageRequest::new(url, &self.config);
                    if let Some(init) = init {
                        init(&mut request);
                    }
                    self.load_url(request).boxed()
                }
                Resource::File(file) => self.load_file(file.clone()).boxed(),
            })
            .collect();

        debug!("loading {} resource(s)", pending.len());
        try_join_all(pending).await
    }

    /// Fetch and decode a single URL resource
    pub async fn load_url(&self, request: ImageRequest) -> Result<LoadedImage> {
        let label = if request.url.starts_with("data:") {
            "data: URL".to_string()
        } else {
            request.url.clone()
        };
        let bytes = match self.fetch(&request).await {
            Ok(b) => b,
            Err(e) => {
                warn!("failed to load {}: {}", label, e);
                return Err(e);
            }
        };
        trace!("fetched {} ({} bytes)", label, bytes.len());
        decode(bytes, None, label).await
    }

    async fn load_file(&self, file: FileBlob) -> Result<LoadedImage> {
        let label = file.label();
        let format = file.mime().and_then(ImageFormat::from_mime_type);
        decode(file.into_bytes(), format, label).await
    }

    async fn fetch(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        match locate(&request.url)? {
            Location::Data => Ok(DataUrl::parse(&request.url)?.into_bytes()),
            Location::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| Error::LoadError(format!("{}: {}", path.display(), e))),
            Location::Http => self.fetch_http(request).await,
        }
    }

    #[cfg(feature = "http")]
    async fn fetch_http(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        let user_agent = request
            .user_agent
            .clone()
            .unwrap_or_else(|| self.config.user_agent.clone());
        let mut builder = self
            .client
            .get(&request.url)
            .header("User-Agent", user_agent);
        for (k, v) in &request.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(ms) = request.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        let res = builder.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::LoadError(format!(
                "HTTP GET {} returned {}",
                request.url, status
            )));
        }
        let body = res.bytes().await?;
        Ok(body.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_http(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        Err(Error::LoadError(format!(
            "HTTP support is disabled; cannot fetch {}",
            request.url
        )))
    }
}

/// Decode raw image bytes off the async threads
pub(crate) async fn decode(
    bytes: Vec<u8>,
    format: Option<ImageFormat>,
    label: String,
) -> Result<LoadedImage> {
    tokio::task::spawn_blocking(move || -> Result<LoadedImage> {
        let decoded = match format {
            Some(f) => image::load_from_memory_with_format(&bytes, f)
                .or_else(|_| image::load_from_memory(&bytes)),
            None => image::load_from_memory(&bytes),
        }
        .map_err(|e| Error::DecodeError(format!("{}: {}", label, e)))?;
        Ok(LoadedImage::new(decoded.to_rgba8(), label))
    })
    .await?
}

/// Load `resources` with a fresh [`Loader`] built from `config`.
pub async fn load(
    resources: &[Resource],
    init: Option<&ImageInit>,
    config: &WatermarkConfig,
) -> Result<Vec<LoadedImage>> {
    Loader::new(config)?.load_all(resources, init).await
}

/// Decode a new image from a data URL
pub async fn create_image(data_url: &str) -> Result<LoadedImage> {
    let parsed = DataUrl::parse(data_url)?;
    let format = ImageFormat::from_mime_type(parsed.mime());
    decode(parsed.into_bytes(), format, "data: URL".to_string()).await
}
