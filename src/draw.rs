//! Draw invocation.
//!
//! A draw function receives the loaded canvases as positional arguments,
//! one per resource and in resource order, and returns the composited
//! canvas. Closures of one to six `Canvas` arguments are supported, plus a
//! `Fn(Vec<Canvas>)` form for any count:
//!
//! ```
//! use watermark::Canvas;
//! # fn takes<A>(_: impl watermark::DrawFn<A>) {}
//! takes(|mut base: Canvas, mark: Canvas| {
//!     base.draw_image(&mark, 0, 0);
//!     base
//! });
//! takes(|all: Vec<Canvas>| all.into_iter().next().ok_or("no canvases"));
//! ```

use crate::canvas::Canvas;
use crate::{Error, Result};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Values a draw function may return.
pub trait IntoComposite {
    fn into_composite(self) -> Result<Canvas>;
}

impl IntoComposite for Canvas {
    fn into_composite(self) -> Result<Canvas> {
        Ok(self)
    }
}

impl<E: fmt::Display> IntoComposite for std::result::Result<Canvas, E> {
    fn into_composite(self) -> Result<Canvas> {
        self.map_err(|e| Error::DrawError(e.to_string()))
    }
}

/// A user draw function. `Args` only disambiguates closure arities.
pub trait DrawFn<Args>: Send + Sync + 'static {
    fn call(&self, canvases: Vec<Canvas>) -> Result<Canvas>;
}

impl<F, R> DrawFn<Vec<Canvas>> for F
where
    F: Fn(Vec<Canvas>) -> R + Send + Sync + 'static,
    R: IntoComposite,
{
    fn call(&self, canvases: Vec<Canvas>) -> Result<Canvas> {
        self(canvases).into_composite()
    }
}

fn arity_error(expected: usize, got: usize) -> Error {
    Error::DrawError(format!(
        "draw function takes {} canvas(es) but {} were loaded",
        expected, got
    ))
}

macro_rules! impl_draw_fn {
    (@canvas $arg:ident) => { Canvas };
    ($count:literal => $($arg:ident),+) => {
        impl<F, R> DrawFn<($(impl_draw_fn!(@canvas $arg),)+)> for F
        where
            F: Fn($(impl_draw_fn!(@canvas $arg)),+) -> R + Send + Sync + 'static,
            R: IntoComposite,
        {
            fn call(&self, canvases: Vec<Canvas>) -> Result<Canvas> {
                let got = canvases.len();
                if got != $count {
                    return Err(arity_error($count, got));
                }
                let mut it = canvases.into_iter();
                $(let $arg = it.next().ok_or_else(|| arity_error($count, got))?;)+
                self($($arg),+).into_composite()
            }
        }
    };
}

impl_draw_fn!(1 => a);
impl_draw_fn!(2 => a, b);
impl_draw_fn!(3 => a, b, c);
impl_draw_fn!(4 => a, b, c, d);
impl_draw_fn!(5 => a, b, c, d, e);
impl_draw_fn!(6 => a, b, c, d, e, f);

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Run `draw` over `canvases`. Errors and panics both become
/// [`Error::DrawError`]; the result is not otherwise checked.
pub fn invoke<A, D: DrawFn<A> + ?Sized>(draw: &D, canvases: Vec<Canvas>) -> Result<Canvas> {
    panic::catch_unwind(AssertUnwindSafe(|| draw.call(canvases)))
        .unwrap_or_else(|payload| Err(Error::DrawError(panic_message(payload))))
}
