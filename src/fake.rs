//! Deterministic fake value synthesis.
//!
//! Address-flavored fake data for customers and sellers, generic over the
//! RNG so callers control seeding. Same seed, same value sequence.

use chrono::{NaiveDate, TimeDelta};
use rand::Rng;

/// US state abbreviations with their 5-digit ZIP code ranges.
///
/// Ranges are approximate but disjoint enough that a ZIP generated for a
/// state is plausible for that state, which is all the dataset needs.
const STATE_ZIP_RANGES: &[(&str, u32, u32)] = &[
    ("AL", 35004, 36925),
    ("AK", 99501, 99950),
    ("AZ", 85001, 86556),
    ("AR", 71601, 72959),
    ("CA", 90001, 96162),
    ("CO", 80001, 81658),
    ("CT", 6001, 6928),
    ("DE", 19701, 19980),
    ("FL", 32004, 34997),
    ("GA", 30001, 31999),
    ("HI", 96701, 96898),
    ("ID", 83201, 83877),
    ("IL", 60001, 62999),
    ("IN", 46001, 47997),
    ("IA", 50001, 52809),
    ("KS", 66002, 67954),
    ("KY", 40003, 42788),
    ("LA", 70001, 71497),
    ("ME", 3901, 4992),
    ("MD", 20588, 21930),
    ("MA", 1001, 2791),
    ("MI", 48001, 49971),
    ("MN", 55001, 56763),
    ("MS", 38601, 39776),
    ("MO", 63001, 65899),
    ("MT", 59001, 59937),
    ("NE", 68001, 69367),
    ("NV", 88901, 89883),
    ("NH", 3031, 3897),
    ("NJ", 7001, 8989),
    ("NM", 87001, 88439),
    ("NY", 10001, 14925),
    ("NC", 27006, 28909),
    ("ND", 58001, 58856),
    ("OH", 43001, 45999),
    ("OK", 73001, 74966),
    ("OR", 97001, 97920),
    ("PA", 15001, 19640),
    ("RI", 2801, 2940),
    ("SC", 29001, 29945),
    ("SD", 57001, 57799),
    ("TN", 37010, 38589),
    ("TX", 73301, 79999),
    ("UT", 84001, 84791),
    ("VT", 5001, 5907),
    ("VA", 20101, 24658),
    ("WA", 98001, 99403),
    ("WV", 24701, 26886),
    ("WI", 53001, 54990),
    ("WY", 82001, 83414),
];

/// Street name stems for fake addresses.
const STREET_NAMES: &[&str] = &[
    "Oak", "Maple", "Cedar", "Pine", "Elm", "Walnut", "Chestnut", "Willow", "Birch", "Aspen",
    "Main", "Park", "Lake", "Hill", "River", "Sunset", "Highland", "Meadow", "Orchard", "Prairie",
    "Ridge", "Valley", "Harbor", "Franklin", "Jefferson", "Madison", "Lincoln", "Monroe",
    "Washington", "Adams",
];

/// Street type suffixes.
const STREET_SUFFIXES: &[&str] = &[
    "St", "Ave", "Blvd", "Dr", "Ln", "Rd", "Ct", "Pl", "Way", "Ter",
];

/// Secondary unit designators, used on a minority of addresses.
const UNIT_DESIGNATORS: &[&str] = &["Apt", "Suite", "Unit"];

/// Fake data generator with a caller-supplied (typically seeded) RNG.
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a random US state abbreviation.
    pub fn state_abbr(&mut self) -> &'static str {
        let idx = self.rng.random_range(0..STATE_ZIP_RANGES.len());
        STATE_ZIP_RANGES[idx].0
    }

    /// Generate a ZIP code within the given state's range.
    ///
    /// Unknown states fall back to a generic 5-digit code.
    pub fn zipcode_in_state(&mut self, state: &str) -> String {
        match STATE_ZIP_RANGES.iter().find(|(abbr, _, _)| *abbr == state) {
            Some((_, lo, hi)) => format!("{:05}", self.rng.random_range(*lo..=*hi)),
            None => format!("{:05}", self.rng.random_range(1000u32..99999)),
        }
    }

    /// Generate a street address, occasionally with a unit designator.
    pub fn street_address(&mut self) -> String {
        let number = self.rng.random_range(1..9999);
        let street = STREET_NAMES[self.rng.random_range(0..STREET_NAMES.len())];
        let suffix = STREET_SUFFIXES[self.rng.random_range(0..STREET_SUFFIXES.len())];

        if self.rng.random_bool(0.15) {
            let unit = UNIT_DESIGNATORS[self.rng.random_range(0..UNIT_DESIGNATORS.len())];
            let unit_no = self.rng.random_range(1..500);
            format!("{} {} {} {} {}", number, street, suffix, unit, unit_no)
        } else {
            format!("{} {} {}", number, street, suffix)
        }
    }

    /// Generate a random date in the inclusive range [start, end].
    ///
    /// Returns `start` when the range is empty or inverted.
    pub fn date_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let span = (end - start).num_days();
        if span <= 0 {
            return start;
        }
        start + TimeDelta::days(self.rng.random_range(0..=span))
    }

    /// Add a random day offset in the inclusive range [min, max].
    pub fn date_offset(&mut self, date: NaiveDate, min: i64, max: i64) -> NaiveDate {
        date + TimeDelta::days(self.rng.random_range(min..=max))
    }

    /// Uniform f64 in [min, max).
    pub fn ratio(&mut self, min: f64, max: f64) -> f64 {
        self.rng.random_range(min..max)
    }

    /// Uniform integer in [min, max].
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Pick a random element from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Pick a random index into a collection of the given length.
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fake(seed: u64) -> FakeData<ChaCha8Rng> {
        FakeData::new(ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_deterministic_sequence() {
        let mut a = fake(42);
        let mut b = fake(42);
        assert_eq!(a.state_abbr(), b.state_abbr());
        assert_eq!(a.street_address(), b.street_address());
        assert_eq!(a.ratio(0.0, 1.0), b.ratio(0.0, 1.0));
    }

    #[test]
    fn test_zipcode_within_state_range() {
        let mut f = fake(7);
        for _ in 0..100 {
            let zip = f.zipcode_in_state("CA");
            let n: u32 = zip.parse().unwrap();
            assert_eq!(zip.len(), 5);
            assert!((90001..=96162).contains(&n), "zip {} out of CA range", zip);
        }
    }

    #[test]
    fn test_zipcode_unknown_state_still_five_digits() {
        let mut f = fake(7);
        assert_eq!(f.zipcode_in_state("XX").len(), 5);
    }

    #[test]
    fn test_date_between_bounds() {
        let mut f = fake(11);
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        for _ in 0..200 {
            let d = f.date_between(start, end);
            assert!(d >= start && d <= end);
        }
    }

    #[test]
    fn test_date_between_empty_range() {
        let mut f = fake(11);
        let d = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        assert_eq!(f.date_between(d, d), d);
        let earlier = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(f.date_between(d, earlier), d);
    }

    #[test]
    fn test_date_offset_negative() {
        let mut f = fake(3);
        let d = NaiveDate::from_ymd_opt(2022, 6, 10).unwrap();
        for _ in 0..50 {
            let j = f.date_offset(d, -1, 3);
            assert!(j >= d - TimeDelta::days(1) && j <= d + TimeDelta::days(3));
        }
    }
}
