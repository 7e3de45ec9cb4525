// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! CL key material.
//!
//! [`PublicKey`] is the read-only carrier of the group parameters every
//! proof is computed against. [`SecretKey`] and [`generate_key_pair`] exist
//! so credentials can be issued for tests and development; the generation
//! here uses ordinary probable primes and is not hardened for production
//! issuance.

use num_bigint::BigInt;
use num_traits::{One, Signed};
use rand_core::{CryptoRng, RngCore};

use crate::{bigmod, Error, SystemParameters};

/// A CL public key: modulus `N`, generators `S` and `Z`, and one base `R_i`
/// per attribute, together with the bit-length parameters of the key.
///
/// Immutable after construction.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PublicKey {
    params: SystemParameters,
    n: BigInt,
    z: BigInt,
    s: BigInt,
    r: Vec<BigInt>,
}

impl PublicKey {
    /// Assembles a public key from its group elements.
    ///
    /// Rejects a non-positive modulus and elements outside `(0, N)` with
    /// [`Error::CryptoParameterMismatch`]; full subgroup membership is the
    /// key generator's obligation.
    pub fn new(
        params: SystemParameters,
        n: BigInt,
        z: BigInt,
        s: BigInt,
        r: Vec<BigInt>,
    ) -> Result<PublicKey, Error> {
        if !n.is_positive() {
            return Err(Error::CryptoParameterMismatch);
        }
        for element in [&z, &s].into_iter().chain(r.iter()) {
            if !element.is_positive() || element >= &n {
                return Err(Error::CryptoParameterMismatch);
            }
        }
        Ok(PublicKey { params, n, z, s, r })
    }

    /// The bit-length parameters of this key.
    pub fn params(&self) -> &SystemParameters {
        &self.params
    }

    /// The modulus `N`.
    pub fn n(&self) -> &BigInt {
        &self.n
    }

    /// The generator `Z`.
    pub fn z(&self) -> &BigInt {
        &self.z
    }

    /// The generator `S`.
    pub fn s(&self) -> &BigInt {
        &self.s
    }

    /// The attribute bases `R_0 .. R_k`.
    pub fn attribute_bases(&self) -> &[BigInt] {
        &self.r
    }

    /// The base for attribute `index`, if the key carries one.
    pub fn base(&self, index: usize) -> Option<&BigInt> {
        self.r.get(index)
    }
}

/// The issuer's secret: the factorisation `N = P * Q`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecretKey {
    p: BigInt,
    q: BigInt,
}

impl SecretKey {
    /// Wraps an existing factorisation.
    pub fn new(p: BigInt, q: BigInt) -> SecretKey {
        SecretKey { p, q }
    }

    /// Euler's totient of the modulus, the exponent group order used when
    /// taking `e`-th roots during signing.
    pub(crate) fn phi(&self) -> BigInt {
        (&self.p - BigInt::one()) * (&self.q - BigInt::one())
    }
}

/// Generates a key pair for `num_attributes` attributes under one of the
/// supported key lengths.
///
/// Suitable for tests and development: the primes are ordinary probable
/// primes rather than safe primes, so the key must not be used for
/// production issuance.
pub fn generate_key_pair<R: RngCore + CryptoRng>(
    rng: &mut R,
    key_length: usize,
    num_attributes: usize,
) -> Result<(PublicKey, SecretKey), Error> {
    let params = *SystemParameters::for_key_length(key_length)?;
    let half = params.l_n / 2;

    let p = bigmod::random_prime_in_range(rng, half, half - 1)?;
    let q = loop {
        let q = bigmod::random_prime_in_range(rng, half, half - 1)?;
        if q != p {
            break q;
        }
    };
    let n = &p * &q;

    // S generates the quadratic residues; Z and the R_i live in <S>.
    let s = loop {
        let x = bigmod::random_below(rng, &n)?;
        let s = (&x * &x) % &n;
        if !s.is_one() && s.is_positive() {
            break s;
        }
    };
    let z = bigmod::mod_pow(&s, &bigmod::random_bits(rng, params.l_n)?, &n)?;
    let mut r = Vec::with_capacity(num_attributes);
    for _ in 0..num_attributes {
        r.push(bigmod::mod_pow(
            &s,
            &bigmod::random_bits(rng, params.l_n)?,
            &n,
        )?);
    }

    let pk = PublicKey::new(params, n, z, s, r)?;
    Ok((pk, SecretKey::new(p, q)))
}
