// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! The Fiat-Shamir transcript and multi-builder challenge computation.
//!
//! The commitment contributions of one or more proof builders are absorbed
//! into a single SHA-256 transcript together with the session context and
//! the verifier nonce; the digest is the common challenge every builder
//! answers. The absorption order is consensus-critical: prover and verifier
//! must feed the transcript bit-identically or verification fails.

use std::collections::HashMap;

use num_bigint::{BigInt, Sign};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::disclosure::{DisclosureProofBuilder, ProofD};
use crate::{bigmod, Error, PublicKey};

/// The symbolic name of the externally supplied user-secret randomizer.
///
/// Supplying the same `"secretkey"` randomizer to several builders proves
/// that their credentials share one user secret.
pub const SECRETKEY_RANDOMIZER: &str = "secretkey";

/// Absorbs one nonnegative integer, length-delimited so that adjacent
/// values cannot be reassociated.
fn absorb(hasher: &mut Sha256, value: &BigInt) {
    let bytes = bigmod::to_bytes_be(value);
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(&bytes);
}

/// Hashes an ordered commitment list into a challenge in `[0, 2^Lh)`.
///
/// The transcript is `count || context || contributions.. || nonce || flag`,
/// each integer big-endian and length-prefixed. The `issig` flag separates
/// the disclosure-proof domain from the signature-proof domain used during
/// issuance.
pub fn create_challenge(
    context: &BigInt,
    nonce: &BigInt,
    contributions: &[BigInt],
    issig: bool,
) -> BigInt {
    let mut hasher = Sha256::new();
    hasher.update((contributions.len() as u32 + 2).to_be_bytes());
    absorb(&mut hasher, context);
    for contribution in contributions {
        absorb(&mut hasher, contribution);
    }
    absorb(&mut hasher, nonce);
    hasher.update([issig as u8]);
    BigInt::from_bytes_be(Sign::Plus, &hasher.finalize())
}

/// An ordered list of disclosure-proof builders answering one challenge.
///
/// The list samples a single `"secretkey"` randomizer and hands it to every
/// builder, so the resulting proofs demonstrate that all credentials carry
/// the same user secret.
#[derive(Default)]
pub struct ProofBuilderList {
    builders: Vec<DisclosureProofBuilder>,
}

impl ProofBuilderList {
    /// An empty builder list.
    pub fn new() -> ProofBuilderList {
        ProofBuilderList::default()
    }

    /// Appends a builder. Order is part of the transcript.
    pub fn push(&mut self, builder: DisclosureProofBuilder) {
        self.builders.push(builder);
    }

    /// Number of builders in the list.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether the list holds no builders.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Commits every builder under a shared secret-key randomizer and hashes
    /// the concatenated contributions into the common challenge.
    pub fn challenge<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        context: &BigInt,
        nonce: &BigInt,
    ) -> Result<BigInt, Error> {
        let mut randomizers = HashMap::new();
        if let Some(first) = self.builders.first() {
            let sk_randomizer = bigmod::random_bits(rng, first.public_key().params().l_m_commit)?;
            randomizers.insert(SECRETKEY_RANDOMIZER.to_owned(), sk_randomizer);
        }

        let mut contributions = Vec::new();
        for builder in &mut self.builders {
            contributions.extend(builder.commit(rng, &randomizers)?);
        }
        Ok(create_challenge(context, nonce, &contributions, false))
    }

    /// Builds every proof against the common challenge, in list order.
    pub fn create_proofs(&self, challenge: &BigInt) -> Result<Vec<ProofD>, Error> {
        self.builders
            .iter()
            .map(|builder| builder.create_proof(challenge))
            .collect()
    }
}

/// Checks a list of plain disclosure proofs that answered one joint
/// challenge, each against its own public key.
///
/// The transcript is recomputed over the concatenated contributions of all
/// proofs, in list order, so a proof from a [`ProofBuilderList`] session
/// only verifies together with its companions. Proofs carrying range or
/// non-revocation sub-proofs are verified individually via
/// [`ProofD::verify`].
pub fn verify_proof_list(
    proofs: &[ProofD],
    keys: &[PublicKey],
    context: &BigInt,
    nonce: &BigInt,
) -> Result<bool, Error> {
    if proofs.len() != keys.len() {
        return Err(Error::CryptoParameterMismatch);
    }
    let challenge = match proofs.first() {
        Some(proof) => &proof.c,
        None => return Ok(false),
    };
    if proofs.iter().any(|proof| &proof.c != challenge) {
        return Ok(false);
    }

    let mut contributions = Vec::new();
    for (proof, pk) in proofs.iter().zip(keys) {
        match proof.transcript_contributions(pk, None, None)? {
            Some(mut part) => contributions.append(&mut part),
            None => return Ok(false),
        }
    }
    Ok(create_challenge(context, nonce, &contributions, false) == *challenge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn challenge_is_deterministic() {
        let context = BigInt::one();
        let nonce = BigInt::from(0xabcdefu32);
        let contributions = vec![BigInt::from(42u32), BigInt::from(99u32)];
        assert_eq!(
            create_challenge(&context, &nonce, &contributions, false),
            create_challenge(&context, &nonce, &contributions, false),
        );
    }

    #[test]
    fn challenge_depends_on_order_and_domain() {
        let context = BigInt::one();
        let nonce = BigInt::from(7u32);
        let ab = vec![BigInt::from(1u32), BigInt::from(2u32)];
        let ba = vec![BigInt::from(2u32), BigInt::from(1u32)];
        assert_ne!(
            create_challenge(&context, &nonce, &ab, false),
            create_challenge(&context, &nonce, &ba, false),
        );
        assert_ne!(
            create_challenge(&context, &nonce, &ab, false),
            create_challenge(&context, &nonce, &ab, true),
        );
    }

    #[test]
    fn length_prefixing_prevents_reassociation() {
        let context = BigInt::one();
        let nonce = BigInt::one();
        // [0x0102, 0x03] vs [0x01, 0x0203]
        let left = vec![BigInt::from(0x0102u32), BigInt::from(0x03u32)];
        let right = vec![BigInt::from(0x01u32), BigInt::from(0x0203u32)];
        assert_ne!(
            create_challenge(&context, &nonce, &left, false),
            create_challenge(&context, &nonce, &right, false),
        );
    }
}
