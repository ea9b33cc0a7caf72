//! CRT reconstruction for RNS residues.
//!
//! Decryption and decoding need the centered integer behind a tuple of
//! residues. The integer can be far wider than 64 bits, but the caller only
//! wants it as an `f64`, so the reconstruction runs Garner's algorithm with
//! balanced mixed-radix digits and evaluates the radix expansion in floating
//! point.

use super::modular::ModQ;

/// Precomputed inverses for Garner reconstruction over a fixed basis.
#[derive(Debug, Clone)]
pub struct GarnerBasis {
    moduli: Vec<u64>,
    /// `inverses[i][j]` = q_j^(-1) mod q_i for j < i.
    inverses: Vec<Vec<u64>>,
}

impl GarnerBasis {
    /// Builds the basis. The moduli must be pairwise coprime and odd.
    ///
    /// # Panics
    ///
    /// Panics if two moduli share a factor.
    pub fn new(moduli: &[u64]) -> Self {
        let inverses = moduli
            .iter()
            .enumerate()
            .map(|(i, &qi)| {
                moduli[..i]
                    .iter()
                    .map(|&qj| match ModQ::inverse(qj % qi, qi) {
                        Some(inv) => inv,
                        None => panic!("moduli {qj} and {qi} are not coprime"),
                    })
                    .collect()
            })
            .collect();

        Self {
            moduli: moduli.to_vec(),
            inverses,
        }
    }

    /// The moduli this basis reconstructs over.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Centered value in (-Q/2, Q/2] of the integer with the given residues,
    /// Q being the product of the moduli, returned as `f64`.
    pub fn reconstruct_centered(&self, residues: &[u64]) -> f64 {
        debug_assert_eq!(residues.len(), self.moduli.len());
        let mut digits = Vec::with_capacity(self.moduli.len());

        for (i, (&qi, &ri)) in self.moduli.iter().zip(residues).enumerate() {
            let mut t = ri % qi;
            for (&vj, &inv) in digits.iter().zip(&self.inverses[i]) {
                let vj_mod = ModQ::from_signed(vj, qi);
                t = ModQ::mul(ModQ::sub(t, vj_mod, qi), inv, qi);
            }
            digits.push(ModQ::to_signed(t, qi));
        }

        let mut value = 0.0f64;
        for (&digit, &q) in digits.iter().zip(&self.moduli).rev() {
            value = value * q as f64 + digit as f64;
        }
        value
    }
}
