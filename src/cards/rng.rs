//! Daily seed and the reproducible layout generator
//!
//! Layout reproducibility depends on the exact output sequence, so the
//! generator is implemented here rather than taken from `rand`. Session
//! randomness (type order, the shuffle tool) uses `rand` instead.

use chrono::{Local, NaiveDate};

use super::config::DifficultyKey;

/// Polynomial rolling hash of `YYYY-MM-DD[-difficulty]`, never zero.
pub fn date_seed(date: NaiveDate, difficulty: Option<DifficultyKey>) -> u32 {
    let mut key = date.format("%Y-%m-%d").to_string();
    if let Some(d) = difficulty {
        key.push('-');
        key.push_str(d.as_str());
    }
    let h = key
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    h.max(1)
}

/// Seed for today's deck at `difficulty`
pub fn today_seed(difficulty: DifficultyKey) -> u32 {
    date_seed(Local::now().date_naive(), Some(difficulty))
}

/// mulberry32: 32 bits of state, uniform floats in [0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// `floor(next * n)` for a slice index or grid coordinate
    pub fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64).floor() as usize
    }

    /// Fisher-Yates from the back, drawing `j = floor(r * (i + 1))`
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_seed_known_values() {
        assert_eq!(date_seed(day(2024, 1, 1), None), 3_681_625_664);
        assert_eq!(date_seed(day(2024, 1, 1), Some(DifficultyKey::Easy)), 3_946_202_991);
        assert_eq!(date_seed(day(2026, 10, 19), Some(DifficultyKey::Hard)), 2_636_968_301);
    }

    #[test]
    fn test_date_seed_varies_by_difficulty() {
        let d = day(2025, 6, 30);
        assert_ne!(
            date_seed(d, Some(DifficultyKey::Easy)),
            date_seed(d, Some(DifficultyKey::Hard))
        );
        assert_eq!(
            date_seed(d, Some(DifficultyKey::Easy)),
            date_seed(d, Some(DifficultyKey::Easy))
        );
    }

    #[test]
    fn test_mulberry32_sequence() {
        let mut rng = Mulberry32::new(1);
        let first = rng.next_f64();
        assert!((first - 0.627_073_940_588_161_3).abs() < 1e-15);
        let second = rng.next_f64();
        assert!((second - 0.002_735_721_180_215_478).abs() < 1e-15);

        let mut rng = Mulberry32::new(3_946_202_991);
        assert!((rng.next_f64() - 0.140_505_390_707_403_42).abs() < 1e-15);
        assert!((rng.next_f64() - 0.725_494_874_641_299_2).abs() < 1e-15);
    }

    #[test]
    fn test_range_and_repeatability() {
        let mut a = Mulberry32::new(42);
        let mut b = Mulberry32::new(42);
        for _ in 0..1000 {
            let x = a.next_f64();
            assert!((0.0..1.0).contains(&x));
            assert_eq!(x, b.next_f64());
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut items: Vec<u32> = (0..50).collect();
        Mulberry32::new(7).shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());

        let mut again: Vec<u32> = (0..50).collect();
        Mulberry32::new(7).shuffle(&mut again);
        assert_eq!(items, again);
    }
}
