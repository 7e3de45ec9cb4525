//! Shared fixtures: issuer keys and issued credentials.
//!
//! Key generation is the expensive part of the suite, so the issuer keys
//! are generated once from fixed seeds and shared by every test in the
//! binary.

#![allow(dead_code)]

use clproof::revocation::{Accumulator, SignedAccumulator, Witness};
use clproof::{
    bigmod, generate_key_pair, generate_secret_attribute, CLSignature, Credential, PublicKey,
    SecretKey,
};
use lazy_static::lazy_static;
use num_bigint::BigInt;
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng;

pub const KEY_LENGTH: usize = 1024;

lazy_static! {
    /// The main issuer: a 1024-bit key with room for 5 attributes.
    pub static ref ISSUER: (PublicKey, SecretKey) = {
        let mut rng = ChaChaRng::seed_from_u64(0x0c1_5eed);
        generate_key_pair(&mut rng, KEY_LENGTH, 5).expect("key generation")
    };
    /// A second, independent issuer for cross-credential sessions.
    pub static ref SECOND_ISSUER: (PublicKey, SecretKey) = {
        let mut rng = ChaChaRng::seed_from_u64(0x0c2_5eed);
        generate_key_pair(&mut rng, KEY_LENGTH, 5).expect("key generation")
    };
}

/// A deterministic RNG per test case.
pub fn seeded_rng(seed: u64) -> ChaChaRng {
    ChaChaRng::seed_from_u64(seed)
}

/// Issues a credential over `attributes` under the given issuer.
pub fn issue(
    rng: &mut ChaChaRng,
    pk: &PublicKey,
    sk: &SecretKey,
    attributes: Vec<BigInt>,
) -> Credential {
    let signature = CLSignature::sign(rng, sk, pk, &attributes).expect("signing");
    Credential::new(pk.clone(), signature, attributes, None).expect("credential")
}

/// A standard 4-attribute block: user secret plus three payload values.
pub fn attribute_block(rng: &mut ChaChaRng) -> Vec<BigInt> {
    vec![
        generate_secret_attribute(rng).expect("secret attribute"),
        BigInt::from(1948u32),
        BigInt::from(0x6d61_7269u64),
        BigInt::from(7u32),
    ]
}

/// Builds a revocation witness against a fresh accumulator: a 120-bit prime
/// member `e` and a root `u` with `u^e = nu (mod N)`.
pub fn revocation_state(rng: &mut ChaChaRng, pk: &PublicKey) -> Witness {
    let e = bigmod::random_prime_in_range(rng, 120, 119).expect("revocation prime");
    let u = bigmod::random_below(rng, pk.n()).expect("accumulator root");
    let nu = bigmod::mod_pow(&u, &e, pk.n()).expect("accumulator value");
    Witness {
        u,
        e,
        signed_accumulator: SignedAccumulator {
            accumulator: Accumulator { nu, index: 0 },
        },
    }
}

/// Issues a revocation-enabled credential; the witness's `e` is appended as
/// the last attribute. Returns the credential and the revocation attribute
/// index.
pub fn issue_revocable(
    rng: &mut ChaChaRng,
    pk: &PublicKey,
    sk: &SecretKey,
    mut attributes: Vec<BigInt>,
) -> (Credential, usize) {
    let witness = revocation_state(rng, pk);
    assert!(witness.verify(pk).expect("witness check"));
    let rev_idx = attributes.len();
    attributes.push(witness.e.clone());
    let signature = CLSignature::sign(rng, sk, pk, &attributes).expect("signing");
    let credential = Credential::new(pk.clone(), signature, attributes, Some(witness))
        .expect("credential");
    (credential, rev_idx)
}
