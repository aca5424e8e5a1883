//! Input validation — compares one player selection with the target.
//!
//! Pure: appending to the player sequence and scoring are left to the
//! session.

use crate::types::{Tile, Verdict};

/// Classify `tile` submitted at `position` of the current round.
///
/// A position past the end of `target` is a mismatch, since no tile was
/// expected there.
#[must_use]
pub fn submit(tile: Tile, position: usize, target: &[Tile]) -> Verdict {
    match target.get(position) {
        Some(expected) if *expected == tile => {
            if position + 1 == target.len() {
                Verdict::RoundComplete
            } else {
                Verdict::Continue
            }
        }
        _ => Verdict::Mismatch,
    }
}

/// Whether `player` is a prefix of `target`.
#[must_use]
pub fn is_prefix(player: &[Tile], target: &[Tile]) -> bool {
    target.starts_with(player)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(indices: &[u8]) -> Vec<Tile> {
        indices.iter().map(|i| Tile::new(*i).expect("valid tile")).collect()
    }

    fn tile(index: u8) -> Tile {
        Tile::new(index).expect("valid tile")
    }

    #[test]
    fn correct_tile_with_more_to_come_continues() {
        let target = seq(&[2, 0, 3]);
        assert_eq!(submit(tile(2), 0, &target), Verdict::Continue);
        assert_eq!(submit(tile(0), 1, &target), Verdict::Continue);
    }

    #[test]
    fn last_correct_tile_completes_round() {
        let target = seq(&[2, 0, 3]);
        assert_eq!(submit(tile(3), 2, &target), Verdict::RoundComplete);
        assert_eq!(submit(tile(1), 0, &seq(&[1])), Verdict::RoundComplete);
    }

    #[test]
    fn wrong_tile_mismatches() {
        let target = seq(&[2, 0, 3]);
        assert_eq!(submit(tile(1), 2, &target), Verdict::Mismatch);
        assert_eq!(submit(tile(0), 0, &target), Verdict::Mismatch);
    }

    #[test]
    fn position_past_end_mismatches() {
        let target = seq(&[2]);
        assert_eq!(submit(tile(2), 1, &target), Verdict::Mismatch);
        assert_eq!(submit(tile(2), 0, &[]), Verdict::Mismatch);
    }

    #[test]
    fn prefix_check() {
        let target = seq(&[1, 2, 3]);
        assert!(is_prefix(&[], &target));
        assert!(is_prefix(&seq(&[1, 2]), &target));
        assert!(!is_prefix(&seq(&[2]), &target));
        assert!(!is_prefix(&seq(&[1, 2, 3, 0]), &target));
    }
}
