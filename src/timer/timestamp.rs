use std::fmt;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Simulated instant as a millisecond + sub-millisecond nanosecond pair.
///
/// Field order gives the derived ordering: milliseconds first, then nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    millisecond: u64,
    nanosecond: u32,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp {
        millisecond: 0,
        nanosecond: 0,
    };

    /// Builds a timestamp, normalizing nanoseconds above one millisecond.
    pub fn new(millisecond: u64, nanosecond: u32) -> Self {
        let mut t = Self {
            millisecond,
            nanosecond: 0,
        };
        t.increase_nanoseconds(nanosecond as u64);
        t
    }

    pub fn from_nanoseconds(total: u64) -> Self {
        Self {
            millisecond: total / NANOS_PER_MILLI,
            nanosecond: (total % NANOS_PER_MILLI) as u32,
        }
    }

    pub fn millisecond(&self) -> u64 {
        self.millisecond
    }

    pub fn nanosecond(&self) -> u32 {
        self.nanosecond
    }

    pub fn increase_nanoseconds(&mut self, added: u64) {
        let total = self.nanosecond as u64 + added;
        self.millisecond += total / NANOS_PER_MILLI;
        self.nanosecond = (total % NANOS_PER_MILLI) as u32;
    }

    pub fn increase_milliseconds(&mut self, added: u64) {
        self.millisecond += added;
    }

    pub fn total_nanoseconds(&self) -> u64 {
        self.millisecond * NANOS_PER_MILLI + self.nanosecond as u64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms {:06}ns", self.millisecond, self.nanosecond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_compares_milliseconds_first() {
        let a = Timestamp::new(1, 999_999);
        let b = Timestamp::new(2, 0);
        let c = Timestamp::new(2, 1);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(Timestamp::new(2, 1), c);
    }

    #[test]
    fn test_nanoseconds_carry_into_milliseconds() {
        let mut t = Timestamp::new(0, 999_000);
        t.increase_nanoseconds(2_500);
        assert_eq!(t.millisecond(), 1);
        assert_eq!(t.nanosecond(), 1_500);

        t.increase_nanoseconds(3_000_000);
        assert_eq!(t.millisecond(), 4);
        assert_eq!(t.nanosecond(), 1_500);
        assert_eq!(t.total_nanoseconds(), 4_001_500);
    }

    #[test]
    fn test_from_nanoseconds() {
        let t = Timestamp::from_nanoseconds(12_000_042);
        assert_eq!(t, Timestamp::new(12, 42));
        assert_eq!(Timestamp::new(0, 2_000_001), Timestamp::new(2, 1));
    }
}
