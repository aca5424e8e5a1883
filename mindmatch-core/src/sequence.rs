//! Sequence generation — picks the tile appended to the target each round.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Tile, TILE_COUNT};

/// Source of the next tile appended to the target sequence.
pub trait TileSource {
    /// Produce the next tile.
    fn next_tile(&mut self) -> Tile;
}

/// Uniformly random tiles, independent of history.
///
/// Immediate repeats are allowed.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    rng: StdRng,
}

impl SequenceGenerator {
    /// Generator seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator with a fixed seed, for reproducible games.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next random tile in `0..TILE_COUNT`.
    pub fn next(&mut self) -> Tile {
        let index = self.rng.gen_range(0..TILE_COUNT);
        Tile::ALL[usize::from(index)]
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl TileSource for SequenceGenerator {
    fn next_tile(&mut self) -> Tile {
        self.next()
    }
}

/// Replays a fixed list of tiles, wrapping around at the end.
///
/// Used to set up known sequences in tests and demos.
#[derive(Debug, Clone)]
pub struct ScriptedTiles {
    tiles: Vec<Tile>,
    cursor: usize,
}

impl ScriptedTiles {
    /// Script the given tiles. An empty script always yields tile 0.
    #[must_use]
    pub fn new(tiles: impl Into<Vec<Tile>>) -> Self {
        Self {
            tiles: tiles.into(),
            cursor: 0,
        }
    }

    /// Script from raw indices, dropping any that are not valid tiles.
    #[must_use]
    pub fn from_indices(indices: &[u8]) -> Self {
        Self::new(indices.iter().copied().filter_map(Tile::new).collect::<Vec<_>>())
    }
}

impl TileSource for ScriptedTiles {
    fn next_tile(&mut self) -> Tile {
        let Some(tile) = self.tiles.get(self.cursor % self.tiles.len().max(1)).copied() else {
            return Tile::ALL[0];
        };
        self.cursor += 1;
        tile
    }
}
