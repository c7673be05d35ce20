//! Ready-made draw functions built on [`crate::position`].

use crate::canvas::{Canvas, ImageSource};
use crate::position::{self, Placement};

fn stamp_at(target: &mut Canvas, mark: &Canvas, x: i64, y: i64, alpha: f32) {
    let previous = target.global_alpha();
    target.set_global_alpha(alpha);
    target.draw_image(mark, x, y);
    target.set_global_alpha(previous);
}

/// `(target, mark) -> target` with `mark` drawn once at `placement`
pub fn image(placement: Placement, alpha: f32) -> impl Fn(Canvas, Canvas) -> Canvas + Clone + Send + Sync + 'static {
    move |mut target: Canvas, mark: Canvas| {
        let at = placement.resolve(target.size(), mark.size());
        stamp_at(&mut target, &mark, at.x, at.y, alpha);
        target
    }
}

/// `(target, mark) -> target` with `mark` repeated over the whole target
pub fn tiled(alpha: f32, gap: u32) -> impl Fn(Canvas, Canvas) -> Canvas + Clone + Send + Sync + 'static {
    move |mut target: Canvas, mark: Canvas| {
        for at in position::tile(target.size(), mark.size(), gap) {
            stamp_at(&mut target, &mark, at.x, at.y, alpha);
        }
        target
    }
}

/// First canvas is the target; every other canvas is stamped onto it at
/// `placement`, in order.
pub fn each(
    placement: Placement,
    alpha: f32,
) -> impl Fn(Vec<Canvas>) -> Result<Canvas, &'static str> + Clone + Send + Sync + 'static {
    move |canvases: Vec<Canvas>| {
        let mut it = canvases.into_iter();
        let mut target = it.next().ok_or("no target image")?;
        for mark in it {
            let at = placement.resolve(target.size(), mark.size());
            stamp_at(&mut target, &mark, at.x, at.y, alpha);
        }
        Ok(target)
    }
}
