//! Pattern scores for Gomoku evaluation
//!
//! A run is classified by its length and by how many of its two ends are
//! blocked (opponent stone or board edge).

/// Pattern scores for evaluation
pub struct PatternScore;

impl PatternScore {
    /// Five (or more) in a row - immediate win
    pub const FIVE: i32 = 500_000;

    /// Open four: _OOOO_
    pub const OPEN_FOUR: i32 = 80_000;
    /// Four with one end blocked: XOOOO_
    pub const CLOSED_FOUR: i32 = 8_000;

    /// Open three: _OOO_
    pub const OPEN_THREE: i32 = 8_000;
    /// Three with one end blocked
    pub const CLOSED_THREE: i32 = 800;

    /// Open two: _OO_
    pub const OPEN_TWO: i32 = 800;
    /// Two with one end blocked
    pub const CLOSED_TWO: i32 = 80;

    /// Lone stone with both sides free
    pub const OPEN_ONE: i32 = 80;
    /// Lone stone touching a block (either one or both sides)
    pub const CLOSED_ONE: i32 = 8;
}

/// Score of a single maximal run.
///
/// Runs blocked on both ends are dead (score 0) unless they already make
/// five or are a single stone.
#[inline]
pub fn run_score(length: u32, blocked_ends: u8) -> i32 {
    match (length, blocked_ends) {
        (l, _) if l >= 5 => PatternScore::FIVE,
        (4, 0) => PatternScore::OPEN_FOUR,
        (4, 1) => PatternScore::CLOSED_FOUR,
        (3, 0) => PatternScore::OPEN_THREE,
        (3, 1) => PatternScore::CLOSED_THREE,
        (2, 0) => PatternScore::OPEN_TWO,
        (2, 1) => PatternScore::CLOSED_TWO,
        (1, 0) => PatternScore::OPEN_ONE,
        (1, _) => PatternScore::CLOSED_ONE,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_score_hierarchy() {
        assert!(PatternScore::FIVE > PatternScore::OPEN_FOUR);
        assert!(PatternScore::OPEN_FOUR > PatternScore::CLOSED_FOUR);
        assert!(PatternScore::CLOSED_FOUR >= PatternScore::OPEN_THREE);
        assert!(PatternScore::OPEN_THREE > PatternScore::CLOSED_THREE);
        assert!(PatternScore::OPEN_TWO > PatternScore::CLOSED_TWO);
    }

    #[test]
    fn test_run_score_table() {
        let table = [
            (5, 2, 500_000),
            (6, 0, 500_000),
            (4, 0, 80_000),
            (4, 1, 8_000),
            (4, 2, 0),
            (3, 0, 8_000),
            (3, 1, 800),
            (3, 2, 0),
            (2, 0, 800),
            (2, 1, 80),
            (2, 2, 0),
            (1, 0, 80),
            (1, 1, 8),
            (1, 2, 8),
        ];
        for (len, blocked, expected) in table {
            assert_eq!(
                run_score(len, blocked),
                expected,
                "run_score({}, {})",
                len,
                blocked
            );
        }
    }
}
