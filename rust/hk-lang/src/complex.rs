//! Complex number arithmetic for the `.hk` numeric tower.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn real(self) -> f64 {
        self.re
    }

    pub fn imag(self) -> f64 {
        self.im
    }

    pub fn conj(self) -> Complex {
        Complex::new(self.re, -self.im)
    }

    pub fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }

    pub fn phase(self) -> f64 {
        self.im.atan2(self.re)
    }

    pub fn polar(self) -> (f64, f64) {
        (self.norm(), self.phase())
    }

    pub fn from_polar(r: f64, theta: f64) -> Complex {
        Complex::new(r * theta.cos(), r * theta.sin())
    }

    pub fn sqrt(self) -> Complex {
        let (r, theta) = self.polar();
        Complex::from_polar(r.sqrt(), theta / 2.0)
    }
}

impl From<f64> for Complex {
    fn from(re: f64) -> Complex {
        Complex::new(re, 0.0)
    }
}

/// Renders a float the way `.hk` wants a Complex component shown: whole
/// numbers keep an explicit `.0` (`sqrt(-4)` prints `0.0 + 2.0i`, not
/// `0 + 2i`), fractional values print with their natural precision.
fn fmt_part(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

impl fmt::Display for Complex {
    /// Always `R + Ii` / `R - Ii`, both parts shown — including a zero real
    /// part, per the language's own `0.0 + 2.0i` rendering of `sqrt(-4)`.
    /// A value arithmetic reduces to a pure real is demoted to a plain
    /// float *before* it reaches here (see `Value` promotion rules); this
    /// Display only ever sees genuine two-part complex values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.im < 0.0 { '-' } else { '+' };
        write!(f, "{} {} {}i", fmt_part(self.re), sign, fmt_part(self.im.abs()))
    }
}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(self.re * rhs.re - self.im * rhs.im, self.re * rhs.im + self.im * rhs.re)
    }
}

impl Div for Complex {
    type Output = Complex;
    fn div(self, rhs: Complex) -> Complex {
        let denom = rhs.re * rhs.re + rhs.im * rhs.im;
        Complex::new(
            (self.re * rhs.re + self.im * rhs.im) / denom,
            (self.im * rhs.re - self.re * rhs.im) / denom,
        )
    }
}

impl Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_like_vectors_in_the_plane() {
        let i = Complex::new(0.0, 1.0);
        assert_eq!(i * i, Complex::new(-1.0, 0.0));
    }

    #[test]
    fn polar_round_trips() {
        let c = Complex::new(3.0, 4.0);
        assert_eq!(c.norm(), 5.0);
        let (r, theta) = c.polar();
        let back = Complex::from_polar(r, theta);
        assert!((back.re - c.re).abs() < 1e-9);
        assert!((back.im - c.im).abs() < 1e-9);
    }

    #[test]
    fn conjugate_negates_imaginary_part() {
        let c = Complex::new(1.0, 2.0);
        assert_eq!(c.conj(), Complex::new(1.0, -2.0));
    }
}
