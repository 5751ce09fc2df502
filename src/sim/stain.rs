//! Persistent tile discolouration left behind by blood and colored fragments
//!
//! Each stained tile remembers which body it came from. A stain lives only as
//! long as something from that body (a fragment or a blood particle) is still
//! active; `sweep` drops the rest.

use std::collections::{HashMap, HashSet};

use super::debris::SourceId;
use super::geometry::{Arena, Platform, tile_under_platform};

#[derive(Debug, Clone, Default)]
pub struct StainRegistry {
    ground: HashMap<u16, SourceId>,
    platform: HashMap<(usize, u16), SourceId>,
}

impl StainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stain the ground tile under `x`.
    ///
    /// Positions outside the viewport are ignored. Drips that came off a
    /// platform do not stain the ground directly beneath that platform.
    pub fn mark_ground(
        &mut self,
        x: f32,
        source: SourceId,
        from_platform: bool,
        arena: &Arena,
        platforms: &[Platform],
    ) {
        let Some(tile) = arena.tile_at(x) else {
            return;
        };
        if from_platform && tile_under_platform(platforms, tile) {
            return;
        }
        self.ground.insert(tile, source);
    }

    /// Stain the tile of `platform`'s surface under `x`, clamped to its span
    pub fn mark_platform(&mut self, platform_index: usize, platform: &Platform, x: f32, source: SourceId) {
        self.platform.insert((platform_index, platform.tile_at(x)), source);
    }

    /// Remove every stain whose source has no live particle left
    pub fn sweep(&mut self, live: &HashSet<SourceId>) {
        self.ground.retain(|_, id| live.contains(id));
        self.platform.retain(|_, id| live.contains(id));
    }

    pub fn ground_stain(&self, tile_x: u16) -> Option<SourceId> {
        self.ground.get(&tile_x).copied()
    }

    pub fn platform_stain(&self, platform_index: usize, tile_x: u16) -> Option<SourceId> {
        self.platform.get(&(platform_index, tile_x)).copied()
    }

    pub fn ground_tiles(&self) -> impl Iterator<Item = (u16, SourceId)> + '_ {
        self.ground.iter().map(|(&x, &id)| (x, id))
    }

    pub fn platform_tiles(&self) -> impl Iterator<Item = (usize, u16, SourceId)> + '_ {
        self.platform.iter().map(|(&(i, x), &id)| (i, x, id))
    }

    /// Every source id still referenced by some stain
    pub fn sources(&self) -> HashSet<SourceId> {
        self.ground.values().chain(self.platform.values()).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ground.len() + self.platform.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ground.is_empty() && self.platform.is_empty()
    }

    pub fn clear(&mut self) {
        self.ground.clear();
        self.platform.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arena, Vec<Platform>) {
        (
            Arena::new(40, 20),
            vec![Platform {
                x: 10.0,
                y: 12.0,
                width: 8.0,
            }],
        )
    }

    #[test]
    fn test_out_of_range_ground_is_noop() {
        let (arena, platforms) = setup();
        let mut stains = StainRegistry::new();
        stains.mark_ground(-0.5, SourceId(1), false, &arena, &platforms);
        stains.mark_ground(40.0, SourceId(1), false, &arena, &platforms);
        assert!(stains.is_empty());
        stains.mark_ground(39.7, SourceId(1), false, &arena, &platforms);
        assert_eq!(stains.ground_stain(39), Some(SourceId(1)));
    }

    #[test]
    fn test_platform_drips_skip_shadowed_tiles() {
        let (arena, platforms) = setup();
        let mut stains = StainRegistry::new();
        stains.mark_ground(12.0, SourceId(2), true, &arena, &platforms);
        assert_eq!(stains.ground_stain(12), None);
        // The same tile is fine when the drip did not come off the platform
        stains.mark_ground(12.0, SourceId(2), false, &arena, &platforms);
        assert_eq!(stains.ground_stain(12), Some(SourceId(2)));
        // Outside the platform shadow the flag does not matter
        stains.mark_ground(30.0, SourceId(2), true, &arena, &platforms);
        assert_eq!(stains.ground_stain(30), Some(SourceId(2)));
    }

    #[test]
    fn test_latest_mark_wins() {
        let (_, platforms) = setup();
        let mut stains = StainRegistry::new();
        stains.mark_platform(0, &platforms[0], 11.2, SourceId(1));
        stains.mark_platform(0, &platforms[0], 11.8, SourceId(3));
        assert_eq!(stains.platform_stain(0, 11), Some(SourceId(3)));
        assert_eq!(stains.len(), 1);
    }

    #[test]
    fn test_platform_edge_overlap_stays_on_span() {
        let (_, platforms) = setup();
        let mut stains = StainRegistry::new();
        // Overhangs the left edge at x=10 and the right edge at x=18
        stains.mark_platform(0, &platforms[0], 9.5, SourceId(1));
        stains.mark_platform(0, &platforms[0], 18.4, SourceId(1));
        assert_eq!(stains.platform_stain(0, 10), Some(SourceId(1)));
        assert_eq!(stains.platform_stain(0, 17), Some(SourceId(1)));
        assert_eq!(stains.platform_stain(0, 9), None);
        assert!(stains.platform_tiles().all(|(_, x, _)| platforms[0].tile_span().contains(&(x as i32))));
    }

    #[test]
    fn test_sweep_drops_dead_sources_and_is_idempotent() {
        let (arena, platforms) = setup();
        let mut stains = StainRegistry::new();
        stains.mark_ground(1.0, SourceId::PLAYER, false, &arena, &platforms);
        stains.mark_ground(2.0, SourceId(4), false, &arena, &platforms);
        stains.mark_platform(0, &platforms[0], 12.0, SourceId(4));
        stains.mark_platform(0, &platforms[0], 13.0, SourceId(5));

        let live: HashSet<SourceId> = [SourceId::PLAYER, SourceId(5)].into_iter().collect();
        stains.sweep(&live);
        assert_eq!(stains.len(), 2);
        assert!(stains.sources().is_subset(&live));

        let before: Vec<_> = {
            let mut v: Vec<_> = stains.ground_tiles().collect();
            v.sort_by_key(|(x, _)| *x);
            v
        };
        stains.sweep(&live);
        let mut after: Vec<_> = stains.ground_tiles().collect();
        after.sort_by_key(|(x, _)| *x);
        assert_eq!(before, after);
        assert_eq!(stains.len(), 2);
    }
}
