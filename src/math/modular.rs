//! Modular arithmetic over Z_q for word-sized moduli.

/// Modular arithmetic operations over Z_q
pub struct ModQ;

impl ModQ {
    /// Add two values modulo q
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        let sum = (a as u128) + (b as u128);
        (sum % (q as u128)) as u64
    }

    /// Subtract two values modulo q (inputs already reduced)
    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    /// Multiply two values modulo q
    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        let prod = (a as u128) * (b as u128);
        (prod % (q as u128)) as u64
    }

    /// Negate a value modulo q
    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        Self::from_i128(val as i128, q)
    }

    /// Convert a wide signed integer to its representation in Z_q
    #[inline]
    pub fn from_i128(val: i128, q: u64) -> u64 {
        val.rem_euclid(q as i128) as u64
    }

    /// Convert from Z_q to the balanced representative in (-q/2, q/2]
    #[inline]
    pub fn to_signed(val: u64, q: u64) -> i64 {
        if val <= q / 2 {
            val as i64
        } else {
            -((q - val) as i64)
        }
    }

    /// Modular exponentiation by squaring
    pub fn pow(base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1u64 % q;
        let mut base = base % q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            exp >>= 1;
            base = Self::mul(base, base, q);
        }
        result
    }

    /// Multiplicative inverse modulo q, if `a` is invertible
    pub fn inverse(a: u64, q: u64) -> Option<u64> {
        let mut t: i128 = 0;
        let mut new_t: i128 = 1;
        let mut r: i128 = q as i128;
        let mut new_r: i128 = (a % q) as i128;

        while new_r != 0 {
            let quotient = r / new_r;
            (t, new_t) = (new_t, t - quotient * new_t);
            (r, new_r) = (new_r, r - quotient * new_r);
        }

        if r != 1 {
            return None;
        }
        Some(t.rem_euclid(q as i128) as u64)
    }

    /// Deterministic Miller-Rabin primality test, exact for all u64 inputs.
    pub fn is_prime(n: u64) -> bool {
        const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

        if n < 2 {
            return false;
        }
        for &p in &WITNESSES {
            if n % p == 0 {
                return n == p;
            }
        }

        let mut d = n - 1;
        let mut s = 0;
        while d % 2 == 0 {
            d /= 2;
            s += 1;
        }

        'witness: for &a in &WITNESSES {
            let mut x = Self::pow(a, d, n);
            if x == 1 || x == n - 1 {
                continue;
            }
            for _ in 1..s {
                x = Self::mul(x, x, n);
                if x == n - 1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: u64 = 1152921504606830593;

    #[test]
    fn test_add_sub() {
        assert_eq!(ModQ::add(Q - 1, 2, Q), 1);
        assert_eq!(ModQ::sub(3, 10, Q), Q - 7);
    }

    #[test]
    fn test_from_signed_multiple_of_q() {
        assert_eq!(ModQ::from_signed(-5, Q), Q - 5);
        assert_eq!(ModQ::from_signed(-(Q as i64), Q), 0);
        assert_eq!(ModQ::from_i128(-2 * Q as i128 - 1, Q), Q - 1);
    }

    #[test]
    fn test_to_signed_balanced() {
        assert_eq!(ModQ::to_signed(5, Q), 5);
        assert_eq!(ModQ::to_signed(Q - 5, Q), -5);
        assert_eq!(ModQ::to_signed(3, 7), 3);
        assert_eq!(ModQ::to_signed(4, 7), -3);
    }

    #[test]
    fn test_pow_and_inverse() {
        assert_eq!(ModQ::pow(3, 4, 7), 4);
        let inv = ModQ::inverse(123456789, Q).unwrap();
        assert_eq!(ModQ::mul(inv, 123456789, Q), 1);
        assert_eq!(ModQ::inverse(6, 9), None);
    }

    #[test]
    fn test_is_prime() {
        assert!(ModQ::is_prime(2));
        assert!(ModQ::is_prime(97));
        assert!(ModQ::is_prime(Q));
        assert!(!ModQ::is_prime(1));
        assert!(!ModQ::is_prime(561));
        assert!(!ModQ::is_prime(3215031751));
    }
}
