//! arithmetic in GF(256)
//!
//! elements are bytes, addition is xor and multiplication reduces modulo the
//! AES polynomial x^8 + x^4 + x^3 + x + 1. multiplication and inversion run a
//! fixed number of rounds with no branches on operand values.

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use zeroize::Zeroize;

use crate::{Error, Result};

/// low byte of the AES reduction polynomial
const REDUCTION: u8 = 0x1b;

/// an element of GF(2^8)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Zeroize)]
pub struct Gf256(pub u8);

impl Gf256 {
    pub const ZERO: Self = Gf256(0);
    pub const ONE: Self = Gf256(1);

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// addition, which is also subtraction in characteristic 2
    #[inline]
    pub fn add(self, rhs: Self) -> Self {
        Gf256(self.0 ^ rhs.0)
    }

    /// carry-less multiply with interleaved reduction
    pub fn mul(self, rhs: Self) -> Self {
        let mut a = self.0;
        let mut b = rhs.0;
        let mut result = 0u8;

        for _ in 0..8 {
            // all-ones when the low bit of b is set
            result ^= a & (b & 1).wrapping_neg();
            let carry = (a >> 7).wrapping_neg();
            a = (a << 1) ^ (REDUCTION & carry);
            b >>= 1;
        }
        Gf256(result)
    }

    /// multiplicative inverse, a^254
    pub fn inverse(self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::DivisionByZero);
        }
        // a^(2^k - 1) for k = 2..=7, then one squaring gives a^254
        let mut result = self;
        for _ in 0..6 {
            result = result.mul(result);
            result = result.mul(self);
        }
        Ok(result.mul(result))
    }

    pub fn div(self, rhs: Self) -> Result<Self> {
        Ok(self.mul(rhs.inverse()?))
    }
}

impl From<u8> for Gf256 {
    fn from(value: u8) -> Self {
        Gf256(value)
    }
}

impl From<Gf256> for u8 {
    fn from(value: Gf256) -> Self {
        value.0
    }
}

impl Add for Gf256 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Gf256::add(self, rhs)
    }
}

impl Sub for Gf256 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Gf256::add(self, rhs)
    }
}

impl Mul for Gf256 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Gf256::mul(self, rhs)
    }
}

impl AddAssign for Gf256 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Gf256 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Gf256 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// evaluate a polynomial given lowest-degree-first coefficients (horner)
pub fn eval_poly(coeffs: &[Gf256], x: Gf256) -> Gf256 {
    coeffs
        .iter()
        .rev()
        .fold(Gf256::ZERO, |acc, &c| acc * x + c)
}
