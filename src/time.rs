//! The time domain.

use std::{
    fmt,
    ops::{Add, Sub}
};

/// Type of time instants and durations.
///
/// As with any discrete-time analysis, a value counts integral multiples of
/// some constant interval (usually microseconds). Values are signed since
/// latest start times derived from tight deadlines may lie before zero.
///
/// [`Time::INFINITY`] compares greater than every finite value and absorbs
/// any finite addend or subtrahend. No operation ever wraps around or
/// saturates to a finite value: overflow of finite arithmetic, as well as
/// subtracting infinity, is a logic error and panics.
#[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Time(i64);

impl Time {
    /// The instant zero.
    pub const ZERO: Self = Self(0);

    /// The infinity sentinel.
    pub const INFINITY: Self = Self(i64::MAX);

    /// Constructs a finite `Time`.
    ///
    /// # Panics
    ///
    /// Panics if `value` collides with the infinity sentinel.
    pub const fn new(value: i64) -> Self {
        assert!(value != i64::MAX, "finite time collides with infinity");
        Self(value)
    }

    /// Tests whether this is the infinity sentinel.
    pub const fn is_infinite(self) -> bool {
        self.0 == i64::MAX
    }

    /// Returns the underlying value, or `None` for infinity.
    pub const fn finite(self) -> Option<i64> {
        if self.is_infinite() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl From<i64> for Time {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, other: Self) -> Self {
        if self.is_infinite() || other.is_infinite() {
            return Self::INFINITY;
        }

        match self.0.checked_add(other.0) {
            Some(sum) if sum != i64::MAX => Self(sum),
            _ => panic!("time overflow in {self} + {other}")
        }
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, other: Self) -> Self {
        assert!(!other.is_infinite(), "cannot subtract infinity from {self}");

        if self.is_infinite() {
            return Self::INFINITY;
        }

        match self.0.checked_sub(other.0) {
            Some(diff) if diff != i64::MAX => Self(diff),
            _ => panic!("time overflow in {self} - {other}")
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finite() {
            Some(value) => write!(f, "{value}"),
            None        => write!(f, "inf")
        }
    }
}

/// A closed interval of time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Interval {
    /// Lower end, inclusive.
    pub from: Time,
    /// Upper end, inclusive.
    pub until: Time
}

impl Interval {
    /// Constructs the finite interval `[from, until]`.
    pub fn new(from: i64, until: i64) -> Self {
        Self { from: Time::new(from), until: Time::new(until) }
    }

    /// Constructs the degenerate interval `[t, t]`.
    pub fn point(t: Time) -> Self {
        Self { from: t, until: t }
    }

    pub fn min(&self) -> Time {
        self.from
    }

    pub fn max(&self) -> Time {
        self.until
    }

    /// Tests whether `t` lies within the interval, ends included.
    pub fn contains(&self, t: Time) -> bool {
        self.from <= t && t <= self.until
    }

    /// Tests whether `from <= until`.
    pub fn valid(&self) -> bool {
        self.from <= self.until
    }

    /// Returns the smallest interval containing both `self` and `other`.
    #[must_use]
    pub fn widen(self, other: Self) -> Self {
        Self {
            from: self.from.min(other.from),
            until: self.until.max(other.until)
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.until)
    }
}
