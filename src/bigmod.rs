// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Arbitrary-precision arithmetic over a composite RSA modulus.
//!
//! Everything in this crate works in `Z_N` for a modulus `N` of unknown
//! factorisation, with exponents that live in plain `Z` and may be negative
//! (the signature randomisation computes `v' = v - e*r` over the integers).
//! This module collects the handful of primitives the protocol needs:
//! modular exponentiation that tolerates negative exponents, modular
//! inversion, uniform sampling of bounded integers, and probabilistic
//! primality testing.

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand_core::{CryptoRng, RngCore};

use crate::Error;

/// Primes below 100, used to cheaply reject composites before Miller-Rabin.
const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Number of Miller-Rabin rounds used wherever this crate tests primality.
pub const PRIMALITY_ROUNDS: usize = 80;

/// Computes `base^exp mod modulus`, accepting negative exponents.
///
/// A negative exponent first inverts `base` modulo `modulus`, which fails
/// with [`Error::ModularInverseFailure`] when the base shares a factor with
/// the modulus (only possible with malformed inputs).
pub fn mod_pow(base: &BigInt, exp: &BigInt, modulus: &BigInt) -> Result<BigInt, Error> {
    if exp.is_negative() {
        let inverse = mod_inverse(base, modulus)?;
        Ok(inverse.modpow(&-exp, modulus))
    } else {
        Ok(base.mod_floor(modulus).modpow(exp, modulus))
    }
}

/// Computes the multiplicative inverse of `a` modulo `modulus`.
///
/// Returns [`Error::ModularInverseFailure`] when `gcd(a, modulus) != 1`.
pub fn mod_inverse(a: &BigInt, modulus: &BigInt) -> Result<BigInt, Error> {
    let gcd = a.mod_floor(modulus).extended_gcd(modulus);
    if !gcd.gcd.is_one() {
        return Err(Error::ModularInverseFailure);
    }
    Ok(gcd.x.mod_floor(modulus))
}

/// Samples a uniform integer in `[0, 2^bits)`.
pub fn random_bits<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> Result<BigInt, Error> {
    if bits == 0 {
        return Ok(BigInt::zero());
    }
    let mut bytes = vec![0u8; (bits + 7) / 8];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|_| Error::RandomnessFailure)?;
    let partial = bits % 8;
    if partial != 0 {
        bytes[0] &= (1u8 << partial) - 1;
    }
    Ok(BigInt::from_bytes_be(Sign::Plus, &bytes))
}

/// Samples a uniform integer in `[0, limit)` by rejection.
pub fn random_below<R: RngCore + CryptoRng>(rng: &mut R, limit: &BigInt) -> Result<BigInt, Error> {
    debug_assert!(limit.is_positive());
    let bits = limit.bits() as usize;
    loop {
        let candidate = random_bits(rng, bits)?;
        if &candidate < limit {
            return Ok(candidate);
        }
    }
}

/// Tests whether `n` is probably prime using `rounds` Miller-Rabin rounds
/// with uniformly random bases, after trial division by small primes.
///
/// A composite survives with probability at most `4^-rounds`.
pub fn probably_prime<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigInt,
    rounds: usize,
) -> Result<bool, Error> {
    let two = BigInt::from(2u32);
    if n < &two {
        return Ok(false);
    }
    for &p in SMALL_PRIMES.iter() {
        let p = BigInt::from(p);
        if n == &p {
            return Ok(true);
        }
        if n.mod_floor(&p).is_zero() {
            return Ok(false);
        }
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_one = n - BigInt::one();
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    let base_limit = n - &two - BigInt::one();
    'witness: for _ in 0..rounds {
        let a = random_below(rng, &base_limit)? + &two;
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// Samples a probable prime in `[2^(a-1), 2^(a-1) + 2^(b-1)]`.
///
/// This is the interval the signature exponent `e` is drawn from, with
/// `a = Le` and `b = LePrime`. Gives up with
/// [`Error::PrimeGenerationFailure`] after an attempt budget proportional to
/// the expected prime gap.
pub fn random_prime_in_range<R: RngCore + CryptoRng>(
    rng: &mut R,
    a: usize,
    b: usize,
) -> Result<BigInt, Error> {
    let start = BigInt::one() << (a - 1);
    let width = BigInt::one() << (b - 1);
    // Expected gap between primes near 2^a is ~a*ln2; x100 head room.
    let attempts = 100 * a;
    for _ in 0..attempts {
        let mut candidate = &start + random_below(rng, &width)?;
        candidate |= BigInt::one();
        if probably_prime(rng, &candidate, PRIMALITY_ROUNDS)? {
            return Ok(candidate);
        }
    }
    Err(Error::PrimeGenerationFailure)
}

/// Encodes a nonnegative integer as big-endian, unsigned, minimal-length
/// bytes, the representation hashed by the Fiat-Shamir transcript.
pub fn to_bytes_be(n: &BigInt) -> Vec<u8> {
    debug_assert!(!n.is_negative());
    n.to_bytes_be().1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn mod_pow_matches_modpow_for_positive_exponents() {
        let base = BigInt::from(1234u32);
        let exp = BigInt::from(567u32);
        let modulus = BigInt::from(7919u32);
        assert_eq!(
            mod_pow(&base, &exp, &modulus).unwrap(),
            base.modpow(&exp, &modulus)
        );
    }

    #[test]
    fn mod_pow_negative_exponent_inverts() {
        let base = BigInt::from(10u32);
        let exp = BigInt::from(-3i32);
        let modulus = BigInt::from(7919u32);
        let result = mod_pow(&base, &exp, &modulus).unwrap();
        let cube = base.modpow(&BigInt::from(3u32), &modulus);
        assert!((result * cube).mod_floor(&modulus).is_one());
    }

    #[test]
    fn mod_pow_negative_exponent_requires_invertible_base() {
        let modulus = BigInt::from(15u32);
        assert_eq!(
            mod_pow(&BigInt::from(5u32), &BigInt::from(-1i32), &modulus),
            Err(Error::ModularInverseFailure)
        );
    }

    #[test]
    fn mod_inverse_round_trips() {
        let modulus = BigInt::from(7919u32);
        for a in [2u32, 17, 1000, 7918] {
            let a = BigInt::from(a);
            let inv = mod_inverse(&a, &modulus).unwrap();
            assert!((a * inv).mod_floor(&modulus).is_one());
        }
    }

    #[test]
    fn random_bits_respects_bound() {
        let mut rng = thread_rng();
        for bits in [1usize, 7, 8, 9, 80, 256] {
            let limit = BigInt::one() << bits;
            for _ in 0..32 {
                assert!(random_bits(&mut rng, bits).unwrap() < limit);
            }
        }
    }

    #[test]
    fn random_below_respects_bound() {
        let mut rng = thread_rng();
        let limit = BigInt::from(1000u32);
        for _ in 0..100 {
            assert!(random_below(&mut rng, &limit).unwrap() < limit);
        }
    }

    #[test]
    fn recognizes_small_primes_and_composites() {
        let mut rng = thread_rng();
        for p in [2u32, 3, 97, 101, 7919, 104729] {
            assert!(probably_prime(&mut rng, &BigInt::from(p), 40).unwrap());
        }
        for c in [1u32, 4, 100, 7917, 104730, 99 * 101] {
            assert!(!probably_prime(&mut rng, &BigInt::from(c), 40).unwrap());
        }
    }

    #[test]
    fn random_prime_lands_in_range() {
        let mut rng = thread_rng();
        let p = random_prime_in_range(&mut rng, 64, 32).unwrap();
        let low = BigInt::one() << 63;
        let high = &low + (BigInt::one() << 31);
        assert!(p >= low && p <= high);
        assert!(probably_prime(&mut rng, &p, 40).unwrap());
    }

    #[test]
    fn byte_encoding_is_minimal() {
        assert_eq!(to_bytes_be(&BigInt::from(0x1234u32)), vec![0x12, 0x34]);
        assert_eq!(to_bytes_be(&BigInt::one()), vec![1]);
    }
}
