//! Static collision surfaces: the ground line and floating platforms
//!
//! Platforms are generated once per round and never move, so every other
//! component queries the same slice.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::SimRng;
use crate::consts::PLATFORM_HEIGHT;

/// Slack on the "was above" half of the swept landing test
pub const LANDING_EPSILON: f32 = 1e-3;

/// Viewport extents and the ground line derived from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: u16,
    pub height: u16,
}

impl Arena {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn width_f(&self) -> f32 {
        self.width as f32
    }

    #[inline]
    pub fn height_f(&self) -> f32 {
        self.height as f32
    }

    /// Row of the ground line (bottom row of the viewport)
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height.saturating_sub(1) as f32
    }

    /// Tile column under `x`, or None if it falls outside the viewport
    #[inline]
    pub fn tile_at(&self, x: f32) -> Option<u16> {
        if x < 0.0 || x.is_nan() {
            return None;
        }
        let tile = x.floor();
        (tile < self.width_f()).then_some(tile as u16)
    }
}

/// Axis-aligned box in screen space (`pos` is the top-left corner)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    #[inline]
    pub fn new(pos: Vec2, w: f32, h: f32) -> Self {
        Self {
            pos,
            size: Vec2::new(w, h),
        }
    }

    /// Strict overlap (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }
}

/// A floating one-cell-tall platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Left edge
    pub x: f32,
    /// Top surface
    pub y: f32,
    pub width: f32,
}

impl Platform {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::new(self.x, self.y), self.width, PLATFORM_HEIGHT)
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Horizontal overlap with a body spanning [left, left + width)
    #[inline]
    pub fn overlaps_x(&self, left: f32, width: f32) -> bool {
        left < self.x + self.width && left + width > self.x
    }

    /// Swept top-surface landing test.
    ///
    /// A body lands only while descending, overlapping horizontally, with its
    /// bottom at or above the top surface on the previous tick and at or below
    /// it now. Bodies rising through the platform from underneath pass.
    pub fn catches(&self, left: f32, width: f32, prev_bottom: f32, bottom: f32, vy: f32) -> bool {
        vy > 0.0
            && self.overlaps_x(left, width)
            && prev_bottom <= self.y + LANDING_EPSILON
            && bottom >= self.y
    }

    /// Tile columns covered by this platform
    pub fn tile_span(&self) -> std::ops::Range<i32> {
        (self.x.floor() as i32)..((self.x + self.width).floor() as i32)
    }

    /// Surface tile under `x`, clamped into `tile_span`
    pub fn tile_at(&self, x: f32) -> u16 {
        let span = self.tile_span();
        let tile = (x.floor() as i32).min(span.end - 1).max(span.start);
        tile.clamp(0, u16::MAX as i32) as u16
    }
}

/// Index of the first platform that catches the body this tick
pub fn find_landing(
    platforms: &[Platform],
    left: f32,
    width: f32,
    prev_bottom: f32,
    bottom: f32,
    vy: f32,
) -> Option<usize> {
    platforms
        .iter()
        .position(|p| p.catches(left, width, prev_bottom, bottom, vy))
}

/// True if a ground tile lies directly beneath any platform
pub fn tile_under_platform(platforms: &[Platform], tile_x: u16) -> bool {
    let x = tile_x as i32;
    platforms.iter().any(|p| p.tile_span().contains(&x))
}

/// Lay out 3-5 platforms evenly across the arena at jumpable heights
pub fn generate_platforms(rng: &mut SimRng, arena: &Arena) -> Vec<Platform> {
    let count = rng.int_inclusive(3, 5);
    let spacing = arena.width_f() / (count + 1) as f32;
    let ground = arena.ground_y();

    (0..count)
        .map(|i| {
            let center = spacing * (i + 1) as f32;
            // A jump peaks about 12 cells up, keep every platform reachable
            let above_ground = rng.range(4.0, 12.0);
            let width = rng.range(12.0, 28.0);
            Platform {
                x: center - width / 2.0,
                y: ground - above_ground - PLATFORM_HEIGHT,
                width,
            }
        })
        .collect()
}
