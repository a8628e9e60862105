//! Numeric helpers.

use gcd::Gcd;
use std::time::Duration;

/// Unsigned number represented by a fraction.
///
/// Clock/baud ratios rarely divide evenly; carrying them as exact
/// fractions avoids committing to a rounding until a caller asks for a
/// float or a [`Duration`].
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Fraction(pub u32, pub u32);
impl Fraction {
    pub fn reduce(self) -> Self {
        let div = self.0.gcd(self.1);
        if div > 1 {
            Fraction(self.0 / div, self.1 / div)
        } else {
            self
        }
    }
    pub fn invert(self) -> Fraction {
        Fraction(self.1, self.0)
    }
    pub fn into_f64(self) -> f64 {
        f64::from(self.0) / f64::from(self.1)
    }
}
impl std::ops::Div<u32> for Fraction {
    type Output = Fraction;
    fn div(self, div: u32) -> Fraction {
        #[allow(clippy::suspicious_arithmetic_impl)]
        Fraction(self.0, self.1 * div).reduce()
    }
}
impl std::ops::Mul<u32> for Fraction {
    type Output = Fraction;
    fn mul(self, mul: u32) -> Fraction {
        Fraction(self.0 * mul, self.1).reduce()
    }
}
impl From<Fraction> for Duration {
    fn from(x: Fraction) -> Self {
        Duration::from_secs(u64::from(x.0)) / x.1
    }
}
