// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Camenisch-Lysyanskaya signatures over a block of attributes.

use num_bigint::BigInt;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{bigmod, Error, PublicKey, SecretKey};

/// A CL signature `(A, e, v)` on a block of attributes, with an optional
/// keyshare contribution `P` for two-party-signing deployments.
///
/// Valid iff `A^e * prod R_i^{m_i} * P? * S^v = Z (mod N)`, `e` lies in
/// `[2^(Le-1), 2^(Le-1) + 2^(LePrime-1)]`, and `e` is probably prime.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CLSignature {
    /// The group element `A`.
    pub a: BigInt,
    /// The prime exponent `e`.
    pub e: BigInt,
    /// The blinding exponent `v`; may be negative after randomisation.
    pub v: BigInt,
    /// The keyshare server's contribution `P`, when the credential's secret
    /// is split between user and server.
    pub keyshare_p: Option<BigInt>,
}

/// The image of an attribute in the signed equation: the attribute itself
/// when it fits in `l_m` bits, its SHA-256 digest otherwise.
pub(crate) fn message_representative(m: &BigInt, l_m: usize) -> BigInt {
    if m.bits() as usize > l_m {
        let digest = Sha256::digest(bigmod::to_bytes_be(m));
        BigInt::from_bytes_be(num_bigint::Sign::Plus, &digest)
    } else {
        m.clone()
    }
}

impl CLSignature {
    /// Signs a block of attributes.
    ///
    /// This is the issuance primitive used by tests and by issuers that
    /// embed this crate; blind obtention is out of scope. Attributes longer
    /// than `l_m` bits are signed through their SHA-256 image.
    pub fn sign<R: RngCore + CryptoRng>(
        rng: &mut R,
        sk: &SecretKey,
        pk: &PublicKey,
        messages: &[BigInt],
    ) -> Result<CLSignature, Error> {
        let params = pk.params();
        if messages.len() > pk.attribute_bases().len() {
            return Err(Error::CryptoParameterMismatch);
        }

        let v = (BigInt::one() << (params.l_v - 1)) + bigmod::random_bits(rng, params.l_v - 1)?;

        let mut acc = bigmod::mod_pow(pk.s(), &v, pk.n())?;
        for (m, base) in messages.iter().zip(pk.attribute_bases()) {
            let m = message_representative(m, params.l_m);
            acc = acc * bigmod::mod_pow(base, &m, pk.n())? % pk.n();
        }
        let q = pk.z() * bigmod::mod_inverse(&acc, pk.n())? % pk.n();

        let phi = sk.phi();
        // gcd(e, phi) can exceed 1 for non-safe primes; resample e if so.
        for _ in 0..4 {
            let e = bigmod::random_prime_in_range(rng, params.l_e, params.l_e_prime)?;
            if let Ok(e_inverse) = bigmod::mod_inverse(&e, &phi) {
                let a = bigmod::mod_pow(&q, &e_inverse, pk.n())?;
                return Ok(CLSignature {
                    a,
                    e,
                    v,
                    keyshare_p: None,
                });
            }
        }
        Err(Error::PrimeGenerationFailure)
    }

    /// Checks this signature over `messages` under `pk`.
    ///
    /// The RNG drives the Miller-Rabin primality test on `e`.
    pub fn verify<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        pk: &PublicKey,
        messages: &[BigInt],
    ) -> Result<bool, Error> {
        let params = pk.params();
        if messages.len() > pk.attribute_bases().len() {
            return Err(Error::CryptoParameterMismatch);
        }

        let low = BigInt::one() << (params.l_e - 1);
        let high = &low + (BigInt::one() << (params.l_e_prime - 1));
        if self.e < low || self.e > high {
            return Ok(false);
        }
        if !bigmod::probably_prime(rng, &self.e, bigmod::PRIMALITY_ROUNDS)? {
            return Ok(false);
        }

        let mut lhs = bigmod::mod_pow(&self.a, &self.e, pk.n())?
            * bigmod::mod_pow(pk.s(), &self.v, pk.n())?
            % pk.n();
        for (m, base) in messages.iter().zip(pk.attribute_bases()) {
            let m = message_representative(m, params.l_m);
            lhs = lhs * bigmod::mod_pow(base, &m, pk.n())? % pk.n();
        }
        if let Some(p) = &self.keyshare_p {
            lhs = lhs * p % pk.n();
        }
        Ok(&lhs == pk.z())
    }

    /// Produces an unlinkable copy `(A', e, v')` satisfying the same CL
    /// equation.
    ///
    /// The exponent `r` carries `l_statzk` bits of slack over the modulus
    /// size, which makes `A'` statistically indistinguishable from uniform
    /// in the subgroup generated by `S`. `v'` is computed over the integers
    /// and may be negative.
    pub fn randomize<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        pk: &PublicKey,
    ) -> Result<CLSignature, Error> {
        let r = bigmod::random_bits(rng, pk.params().l_ra)?;
        let a = &self.a * bigmod::mod_pow(pk.s(), &r, pk.n())? % pk.n();
        let v = &self.v - &self.e * r;
        Ok(CLSignature {
            a,
            e: self.e.clone(),
            v,
            keyshare_p: self.keyshare_p.clone(),
        })
    }
}
