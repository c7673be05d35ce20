//! Coordinate helpers for draw functions.
//!
//! Every helper takes the target (background) size and the mark size and
//! returns where the mark's top-left corner goes. Nothing in the pipeline
//! calls these; they exist for caller-written draw functions.

use crate::{Error, Result};
use std::str::FromStr;

/// Distance kept between a corner-placed mark and the target edges
pub const MARGIN: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

pub fn upper_left(_target: Size, _mark: Size) -> Point {
    Point::new(MARGIN, MARGIN)
}

pub fn upper_right(target: Size, mark: Size) -> Point {
    Point::new(target.width as i64 - (mark.width as i64 + MARGIN), MARGIN)
}

pub fn lower_left(target: Size, mark: Size) -> Point {
    Point::new(MARGIN, target.height as i64 - (mark.height as i64 + MARGIN))
}

pub fn lower_right(target: Size, mark: Size) -> Point {
    Point::new(
        target.width as i64 - (mark.width as i64 + MARGIN),
        target.height as i64 - (mark.height as i64 + MARGIN),
    )
}

/// Mark centred on the target (rounded towards the top-left)
pub fn center(target: Size, mark: Size) -> Point {
    Point::new(
        (target.width as i64 - mark.width as i64).div_euclid(2),
        (target.height as i64 - mark.height as i64).div_euclid(2),
    )
}

/// Origins of a grid of marks, `gap` pixels apart, covering the target.
/// Row-major, starting at (0, 0). Empty for a zero-sized mark.
pub fn tile(target: Size, mark: Size, gap: u32) -> Vec<Point> {
    if mark.width == 0 || mark.height == 0 {
        return Vec::new();
    }
    let step_x = (mark.width as usize).saturating_add(gap as usize);
    let step_y = (mark.height as usize).saturating_add(gap as usize);
    let mut points = Vec::new();
    for y in (0..target.height).step_by(step_y) {
        for x in (0..target.width).step_by(step_x) {
            points.push(Point::new(x as i64, y as i64));
        }
    }
    points
}

/// Named single-mark layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    UpperLeft,
    UpperRight,
    LowerLeft,
    #[default]
    LowerRight,
    Center,
}

impl Placement {
    pub fn resolve(self, target: Size, mark: Size) -> Point {
        match self {
            Placement::UpperLeft => upper_left(target, mark),
            Placement::UpperRight => upper_right(target, mark),
            Placement::LowerLeft => lower_left(target, mark),
            Placement::LowerRight => lower_right(target, mark),
            Placement::Center => center(target, mark),
        }
    }
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper-left" => Ok(Placement::UpperLeft),
            "upper-right" => Ok(Placement::UpperRight),
            "lower-left" => Ok(Placement::LowerLeft),
            "lower-right" => Ok(Placement::LowerRight),
            "center" => Ok(Placement::Center),
            other => Err(Error::ConfigError(format!("unknown placement: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Size = Size { width: 200, height: 100 };
    const MARK: Size = Size { width: 50, height: 20 };

    #[test]
    fn corners_keep_margin() {
        assert_eq!(upper_left(TARGET, MARK), Point::new(10, 10));
        assert_eq!(upper_right(TARGET, MARK), Point::new(140, 10));
        assert_eq!(lower_left(TARGET, MARK), Point::new(10, 70));
        assert_eq!(lower_right(TARGET, MARK), Point::new(140, 70));
    }

    #[test]
    fn center_rounds_down_and_handles_oversized_marks() {
        assert_eq!(center(TARGET, MARK), Point::new(75, 40));
        assert_eq!(center(Size::new(5, 5), Size::new(2, 2)), Point::new(1, 1));
        assert_eq!(center(Size::new(10, 10), Size::new(13, 13)), Point::new(-2, -2));
    }

    #[test]
    fn tile_covers_target() {
        let pts = tile(Size::new(100, 50), Size::new(40, 20), 10);
        // x: 0, 50; y: 0, 30
        assert_eq!(
            pts,
            vec![
                Point::new(0, 0),
                Point::new(50, 0),
                Point::new(0, 30),
                Point::new(50, 30)
            ]
        );
        assert!(tile(TARGET, Size::new(0, 5), 0).is_empty());
    }

    #[test]
    fn tile_with_huge_gap_places_one_mark() {
        let pts = tile(Size::new(10, 10), Size::new(2, 2), u32::MAX);
        assert_eq!(pts, vec![Point::new(0, 0)]);
        let pts = tile(Size::new(10, 10), Size::new(u32::MAX, u32::MAX), u32::MAX);
        assert_eq!(pts, vec![Point::new(0, 0)]);
    }

    #[test]
    fn placement_parses_and_resolves() {
        let p: Placement = "Lower-Right".parse().unwrap();
        assert_eq!(p.resolve(TARGET, MARK), lower_right(TARGET, MARK));
        assert!("middle".parse::<Placement>().is_err());
    }
}
