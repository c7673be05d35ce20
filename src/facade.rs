//! The chainable watermark façade.
//!
//! A [`Watermark`] is an immutable value holding the input resources, the
//! optional init callback, the configuration and one pending result. Every
//! conversion method returns a *new* façade wrapping a new pending chain:
//!
//! ```text
//! data_url(draw) = load → map_to_canvas → invoke(draw) → encode
//! blob(draw)     = data_url(draw) → decode data URL to bytes
//! image(draw)    = data_url(draw) → decode data URL to an image
//! ```
//!
//! Each chain starts from the resources again; the façade's own pending
//! value is never an input. Results are observed with [`Watermark::then`]
//! or by awaiting the façade.

use crate::canvas::map_to_canvas;
use crate::convert::{self, Blob};
use crate::draw::{invoke, DrawFn};
use crate::loader::{self, ImageInit, ImageRequest, LoadedImage};
use crate::resource::Resource;
use crate::{Error, Result, WatermarkConfig};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::trace;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

type Pending<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Start a chain. Inside a tokio runtime the chain is spawned right away
/// and runs to completion whether or not anyone observes it; outside one
/// it runs when first observed.
fn start<T>(chain: BoxFuture<'static, Result<T>>) -> Pending<T>
where
    T: Clone + Send + Sync + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let task = handle.spawn(chain);
            async move { task.await? }.boxed().shared()
        }
        Err(_) => chain.shared(),
    }
}

/// Chainable watermark value. See the module docs.
pub struct Watermark<T = ()> {
    resources: Arc<[Resource]>,
    init: Option<ImageInit>,
    config: Arc<WatermarkConfig>,
    pending: Pending<T>,
}

/// Create a façade over `resources` with the default configuration.
///
/// ```no_run
/// # async fn run() -> watermark::Result<()> {
/// use watermark::{watermark, Canvas};
///
/// let url = watermark(["photo.png", "logo.png"])
///     .data_url(|mut photo: Canvas, logo: Canvas| {
///         photo.set_global_alpha(0.5);
///         photo.draw_image(&logo, 10, 10);
///         photo
///     })
///     .await?;
/// assert!(url.starts_with("data:image/png;base64,"));
/// # Ok(())
/// # }
/// ```
pub fn watermark<I, R>(resources: I) -> Watermark
where
    I: IntoIterator<Item = R>,
    R: Into<Resource>,
{
    Watermark::new(resources, None, WatermarkConfig::default())
}

impl Watermark<()> {
    pub fn new<I, R>(resources: I, init: Option<ImageInit>, config: WatermarkConfig) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        let resources: Arc<[Resource]> = resources.into_iter().map(Into::into).collect();
        Self {
            resources,
            init,
            config: Arc::new(config),
            pending: futures::future::ready(Ok(())).boxed().shared(),
        }
    }
}

impl<T> Watermark<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn init(&self) -> Option<&ImageInit> {
        self.init.as_ref()
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// New façade with `init` run on every URL request of later chains
    pub fn with_init<F>(&self, init: F) -> Watermark<T>
    where
        F: Fn(&mut ImageRequest) + Send + Sync + 'static,
    {
        Watermark {
            resources: self.resources.clone(),
            init: Some(Arc::new(init)),
            config: self.config.clone(),
            pending: self.pending.clone(),
        }
    }

    /// New façade using `config` for later chains
    pub fn with_config(&self, config: WatermarkConfig) -> Watermark<T> {
        Watermark {
            resources: self.resources.clone(),
            init: self.init.clone(),
            config: Arc::new(config),
            pending: self.pending.clone(),
        }
    }

    fn chain<U>(&self, pending: Pending<U>) -> Watermark<U> {
        Watermark {
            resources: self.resources.clone(),
            init: self.init.clone(),
            config: self.config.clone(),
            pending,
        }
    }

    /// Load every resource, draw, and encode the result as a data URL
    pub fn data_url<A, D>(&self, draw: D) -> Watermark<String>
    where
        D: DrawFn<A>,
    {
        let resources = self.resources.clone();
        let init = self.init.clone();
        let config = self.config.clone();

        let chain = async move {
            let images = loader::load(&resources, init.as_ref(), &config).await?;
            trace!("loaded {} image(s), drawing", images.len());
            tokio::task::spawn_blocking(move || -> Result<String> {
                let canvases = map_to_canvas(&images);
                let composite = invoke(&draw, canvases)?;
                trace!(
                    "composited {}x{} canvas",
                    composite.width(),
                    composite.height()
                );
                convert::data_url(&composite, config.format)
            })
            .await?
        };

        self.chain(start(chain.boxed()))
    }

    /// [`Watermark::data_url`] decoded into a [`Blob`]
    pub fn blob<A, D>(&self, draw: D) -> Watermark<Blob>
    where
        D: DrawFn<A>,
    {
        let url = self.data_url(draw);
        let pending = url.pending.clone();
        url.chain(start(async move { convert::blob(pending.await?).await }.boxed()))
    }

    /// [`Watermark::data_url`] decoded into a new [`LoadedImage`]
    pub fn image<A, D>(&self, draw: D) -> Watermark<LoadedImage>
    where
        D: DrawFn<A>,
    {
        let url = self.data_url(draw);
        let pending = url.pending.clone();
        url.chain(start(
            async move { loader::create_image(&pending.await?).await }.boxed(),
        ))
    }

    /// Register continuations on the pending result. The returned future
    /// yields whichever continuation ran. May be called any number of times.
    pub fn then<U, F, E>(&self, on_fulfilled: F, on_rejected: E) -> impl Future<Output = U> + Send + 'static
    where
        F: FnOnce(T) -> U + Send + 'static,
        E: FnOnce(Error) -> U + Send + 'static,
    {
        let pending = self.pending.clone();
        async move {
            match pending.await {
                Ok(value) => on_fulfilled(value),
                Err(err) => on_rejected(err),
            }
        }
    }
}

impl<T> Clone for Watermark<T> {
    fn clone(&self) -> Self {
        Self {
            resources: self.resources.clone(),
            init: self.init.clone(),
            config: self.config.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<T> IntoFuture for Watermark<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.then(Ok, Err).boxed()
    }
}

impl<T: Clone> fmt::Debug for Watermark<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watermark")
            .field("resources", &self.resources)
            .field("init", &self.init.is_some())
            .field("config", &self.config)
            .field("resolved", &self.pending.peek().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::convert::DataUrl;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png_data_url(w: u32, h: u32, px: [u8; 4]) -> String {
        let canvas = Canvas::from_rgba(RgbaImage::from_pixel(w, h, Rgba(px)));
        convert::data_url(&canvas, Default::default()).unwrap()
    }

    #[tokio::test]
    async fn fresh_facade_resolves_to_unit() {
        let wm = watermark(Vec::<Resource>::new());
        assert_eq!(wm.await, Ok(()));
    }

    #[tokio::test]
    async fn data_url_composites_in_order() {
        let wm = watermark([png_data_url(4, 4, [255, 0, 0, 255]), png_data_url(2, 2, [0, 255, 0, 255])]);
        let url = wm
            .data_url(|mut a: Canvas, b: Canvas| {
                assert_eq!((a.width(), b.width()), (4, 2));
                a.draw_image(&b, 2, 2);
                a
            })
            .await
            .unwrap();
        let decoded = image::load_from_memory(DataUrl::parse(&url).unwrap().bytes())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(3, 3).0, [0, 255, 0, 255]);
    }

    #[tokio::test]
    async fn chaining_does_not_touch_the_original() {
        let wm = watermark([png_data_url(1, 1, [0, 0, 0, 255])]);
        let first = wm.data_url(|a: Canvas| a);
        let second = wm.data_url(|a: Canvas| a);
        assert_eq!(wm.resources().len(), 1);
        assert!(wm.init().is_none());
        assert_eq!(first.await, second.await);
        assert_eq!(wm.await, Ok(()));
    }

    #[tokio::test]
    async fn then_routes_to_the_right_continuation() {
        let wm = watermark(["data:image/png;base64,!!"]);
        let chain = wm.data_url(|a: Canvas| a);
        let fulfilled = Arc::new(AtomicUsize::new(0));
        let seen = fulfilled.clone();
        let outcome = chain
            .then(
                move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    "ok".to_string()
                },
                |e| e.to_string(),
            )
            .await;
        assert!(outcome.starts_with("Conversion failed"));
        assert_eq!(fulfilled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn then_can_be_observed_many_times() {
        let chain = watermark([png_data_url(2, 3, [1, 2, 3, 255])]).image(|a: Canvas| a);
        let w = chain.then(|img| img.width(), |_| 0).await;
        let h = chain.then(|img| img.height(), |_| 0).await;
        assert_eq!((w, h), (2, 3));
    }

    #[tokio::test]
    async fn blob_has_png_bytes() {
        let blob = watermark([png_data_url(5, 5, [9, 9, 9, 255])])
            .blob(|a: Canvas| a)
            .await
            .unwrap();
        assert_eq!(blob.mime(), "image/png");
        assert!(!blob.is_empty());
        assert_eq!(&blob.as_bytes()[0..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn with_init_returns_a_new_facade() {
        let wm = watermark(["a.png"]);
        let with = wm.with_init(|req| {
            req.headers.insert("X-Test".into(), "1".into());
        });
        assert!(wm.init().is_none());
        assert!(with.init().is_some());
        assert_eq!(with.resources(), wm.resources());
    }
}
