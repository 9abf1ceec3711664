use std::{
    fmt,
    ops::{Add, AddAssign, Sub},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize, JsonSchema)]
pub struct Meters(f64);

impl Meters {
    pub const ZERO: Meters = Meters(0.0);

    pub const fn new(value: f64) -> Self {
        Meters(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    pub fn kilometers(&self) -> f64 {
        self.0 / 1000.0
    }
}

impl From<f64> for Meters {
    fn from(value: f64) -> Self {
        Meters::new(value)
    }
}

impl From<Meters> for f64 {
    fn from(value: Meters) -> Self {
        value.0
    }
}

impl Add for Meters {
    type Output = Meters;

    fn add(self, other: Meters) -> Meters {
        Meters(self.0 + other.0)
    }
}

impl AddAssign for Meters {
    fn add_assign(&mut self, other: Meters) {
        self.0 += other.0;
    }
}

impl Sub for Meters {
    type Output = Meters;

    fn sub(self, other: Meters) -> Meters {
        Meters(self.0 - other.0)
    }
}

/// Human readable distance: whole meters below one kilometer, two decimals above.
impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1000.0 {
            write!(f, "{} m", self.0.round() as i64)
        } else {
            write!(f, "{:.2} km", self.kilometers())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Meters::new(0.0).to_string(), "0 m");
        assert_eq!(Meters::new(849.6).to_string(), "850 m");
        assert_eq!(Meters::new(1000.0).to_string(), "1.00 km");
        assert_eq!(Meters::new(1105.3).to_string(), "1.11 km");
    }

    #[test]
    fn test_arithmetic() {
        let mut total = Meters::new(10.0) + Meters::new(5.0);
        total += Meters::new(1.0);
        assert_eq!(total, Meters::new(16.0));
        assert_eq!(total - Meters::new(6.0), Meters::new(10.0));
        assert!(Meters::new(9.9) < Meters::new(10.0));
    }
}
