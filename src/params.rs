// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Bit-length parameter sets for the supported key lengths.

use num_bigint::BigInt;
use rand_core::{CryptoRng, RngCore};

use crate::{bigmod, Error};

/// The bit-length constants governing a CL key and every proof made under it.
///
/// The first six fields are the base parameters of a key length; the rest are
/// derived from them by [`SystemParameters::new`] and never set directly, so
/// a parameter set is always internally consistent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemParameters {
    /// Size of the modulus `N`.
    pub l_n: usize,
    /// Size of an attribute.
    pub l_m: usize,
    /// Size of the signature exponent `e`.
    pub l_e: usize,
    /// Size of the interval the prime `e` is drawn from.
    pub l_e_prime: usize,
    /// Size of the Fiat-Shamir challenge hash.
    pub l_h: usize,
    /// Statistical zero-knowledge slack.
    pub l_statzk: usize,
    /// Size of the Schnorr commitment to `e`.
    pub l_e_commit: usize,
    /// Size of the Schnorr commitment to an attribute.
    pub l_m_commit: usize,
    /// Size of the signature blinding term `v`.
    pub l_v: usize,
    /// Size of the Schnorr commitment to `v`.
    pub l_v_commit: usize,
    /// Size of the signature-randomisation exponent.
    pub l_ra: usize,
}

impl SystemParameters {
    /// Derives a full parameter set from the six base lengths.
    pub const fn new(
        l_n: usize,
        l_m: usize,
        l_e: usize,
        l_e_prime: usize,
        l_h: usize,
        l_statzk: usize,
    ) -> SystemParameters {
        let l_v = l_n + 2 * l_statzk + l_h + l_m + 4;
        SystemParameters {
            l_n,
            l_m,
            l_e,
            l_e_prime,
            l_h,
            l_statzk,
            l_e_commit: l_e_prime + l_statzk + l_h,
            l_m_commit: l_m + l_statzk + l_h,
            l_v,
            l_v_commit: l_v + l_statzk + l_h,
            l_ra: l_n + l_statzk,
        }
    }

    /// Returns the parameter set for a key length, one of 1024, 2048 or 4096.
    pub fn for_key_length(bits: usize) -> Result<&'static SystemParameters, Error> {
        match bits {
            1024 => Ok(&PARAMS_1024),
            2048 => Ok(&PARAMS_2048),
            4096 => Ok(&PARAMS_4096),
            other => Err(Error::UnsupportedKeyLength(other)),
        }
    }
}

/// Parameters for 1024-bit keys.
pub const PARAMS_1024: SystemParameters = SystemParameters::new(1024, 256, 597, 120, 256, 80);

/// Parameters for 2048-bit keys.
pub const PARAMS_2048: SystemParameters = SystemParameters::new(2048, 256, 645, 120, 256, 128);

/// Parameters for 4096-bit keys.
pub const PARAMS_4096: SystemParameters = SystemParameters::new(4096, 512, 901, 120, 256, 128);

/// Samples a fresh user secret attribute.
///
/// Uses the attribute size of the 1024-bit parameter set, so the secret fits
/// under every supported key length.
pub fn generate_secret_attribute<R: RngCore + CryptoRng>(rng: &mut R) -> Result<BigInt, Error> {
    bigmod::random_bits(rng, PARAMS_1024.l_m)
}
