// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Non-revocation: accumulator witnesses and their membership proofs.
//!
//! A credential is unrevoked while its witness `(u, e)` satisfies
//! `u^e = nu (mod N)` against the current accumulator value `nu`. The proof
//! here shows knowledge of such a pair without revealing it, with the
//! Schnorr randomizer for `e` (`"alpha"`) shared with the main disclosure
//! proof's randomizer on the revocation attribute. That shared randomizer
//! is single-use: reusing it across two challenges lets a verifier solve
//! for `e` and recover the witness.
//!
//! The accumulator update pipeline (revocation events, signed update
//! messages) lives outside this crate; a [`SignedAccumulator`] is consumed
//! here as an opaque carrier of the value and its epoch index.

use std::collections::HashMap;

use num_bigint::BigInt;
use rand_core::{CryptoRng, RngCore};

use crate::{bigmod, Error, PublicKey, SystemParameters};

/// An accumulator value at a given epoch.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accumulator {
    /// The accumulated product `nu`.
    pub nu: BigInt,
    /// Monotonically non-decreasing epoch counter.
    pub index: u64,
}

/// An accumulator as published by the revocation authority.
///
/// Validating the authority's signature over the accumulator happens in the
/// update pipeline, outside this crate; provers treat the carrier as
/// trusted input.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignedAccumulator {
    /// The accumulator value and epoch.
    pub accumulator: Accumulator,
}

/// A membership witness `(u, e)` for the accumulator: `u^e = nu (mod N)`.
///
/// `e` doubles as the credential's revocation attribute; the disclosure
/// proof locates the attribute whose value equals it.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Witness {
    /// The accumulator root.
    pub u: BigInt,
    /// The prime member; equals the credential's revocation attribute.
    pub e: BigInt,
    /// The accumulator this witness is valid against.
    pub signed_accumulator: SignedAccumulator,
}

impl Witness {
    /// The epoch of the accumulator this witness was updated to.
    pub fn index(&self) -> u64 {
        self.signed_accumulator.accumulator.index
    }

    /// Checks `u^e = nu (mod N)`.
    pub fn verify(&self, pk: &PublicKey) -> Result<bool, Error> {
        let nu = &self.signed_accumulator.accumulator.nu;
        Ok(&bigmod::mod_pow(&self.u, &self.e, pk.n())? == nu)
    }
}

/// Samples a fresh `"alpha"` randomizer.
///
/// Drawn from the same domain as the main proof's attribute randomizers, so
/// one value can serve both proofs.
pub fn new_proof_randomizer<R: RngCore + CryptoRng>(
    rng: &mut R,
    params: &SystemParameters,
) -> Result<BigInt, Error> {
    bigmod::random_bits(rng, params.l_m_commit)
}

/// A completed membership proof.
///
/// Carries the blinded witness, the Pedersen commitment tying the blinding
/// together, the accumulator it was made against, and the Schnorr
/// responses. The `"alpha"` response is removed by the disclosure prover
/// before the proof ships; verifiers re-derive it from the main proof's
/// response on the revocation attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proof {
    /// The blinded witness `C_u = u * S^r1`.
    pub c_u: BigInt,
    /// The Pedersen commitment `C_r = Z^r1 * S^r2`.
    pub c_r: BigInt,
    /// The accumulator the proof speaks about.
    pub signed_accumulator: SignedAccumulator,
    /// Schnorr responses keyed by name.
    pub responses: HashMap<String, BigInt>,
}

impl Proof {
    /// Reconstructs the five commitment contributions from the responses,
    /// the challenge, and the externally re-derived `alpha` response.
    pub fn reconstruct(
        &self,
        pk: &PublicKey,
        challenge: &BigInt,
        alpha: &BigInt,
    ) -> Result<Vec<BigInt>, Error> {
        let n = pk.n();
        let response = |name: &str| -> Result<&BigInt, Error> {
            self.responses
                .get(name)
                .ok_or(Error::CryptoParameterMismatch)
        };
        let beta = response("beta")?;
        let delta = response("delta")?;
        let epsilon = response("epsilon")?;
        let zeta = response("zeta")?;

        let t1 = bigmod::mod_pow(pk.z(), beta, n)?
            * bigmod::mod_pow(pk.s(), delta, n)?
            % n
            * bigmod::mod_pow(&self.c_r, &-challenge, n)?
            % n;
        let t2 = bigmod::mod_pow(&self.c_r, alpha, n)?
            * bigmod::mod_pow(pk.z(), &-epsilon, n)?
            % n
            * bigmod::mod_pow(pk.s(), &-zeta, n)?
            % n;
        let nu = &self.signed_accumulator.accumulator.nu;
        let t3 = bigmod::mod_pow(&self.c_u, alpha, n)?
            * bigmod::mod_pow(pk.s(), &-epsilon, n)?
            % n
            * bigmod::mod_pow(nu, &-challenge, n)?
            % n;

        Ok(vec![self.c_u.clone(), self.c_r.clone(), t1, t2, t3])
    }
}

/// The secrets and randomizers behind an emitted commitment list.
#[derive(Clone, Debug)]
pub struct ProofCommit {
    u: BigInt,
    e: BigInt,
    r1: BigInt,
    r2: BigInt,
    // v = e*r1 and w = e*r2 close the multiplicative relations.
    v: BigInt,
    w: BigInt,
    randomizers: HashMap<String, BigInt>,
    c_u: BigInt,
    c_r: BigInt,
    signed_accumulator: SignedAccumulator,
}

/// Emits the initial commitment list for a witness.
///
/// `randomizer` becomes the `"alpha"` randomizer for `e`. The returned list
/// is `[C_u, C_r, T1, T2, T3]`; this multi-exponentiation is the expensive
/// step the credential's builder cache exists to front-load.
pub fn new_proof_commit<R: RngCore + CryptoRng>(
    rng: &mut R,
    pk: &PublicKey,
    witness: &Witness,
    randomizer: &BigInt,
) -> Result<(Vec<BigInt>, ProofCommit), Error> {
    let params = pk.params();
    let n = pk.n();

    let r1 = bigmod::random_bits(rng, params.l_ra)?;
    let r2 = bigmod::random_bits(rng, params.l_ra)?;
    let v = &witness.e * &r1;
    let w = &witness.e * &r2;

    let c_u = &witness.u * bigmod::mod_pow(pk.s(), &r1, n)? % n;
    let c_r = bigmod::mod_pow(pk.z(), &r1, n)? * bigmod::mod_pow(pk.s(), &r2, n)? % n;

    let blinding_bits = params.l_ra + params.l_statzk + params.l_h;
    let product_bits = params.l_m + params.l_ra + params.l_statzk + params.l_h;
    let mut randomizers = HashMap::new();
    randomizers.insert("alpha".to_owned(), randomizer.clone());
    randomizers.insert("beta".to_owned(), bigmod::random_bits(rng, blinding_bits)?);
    randomizers.insert("delta".to_owned(), bigmod::random_bits(rng, blinding_bits)?);
    randomizers.insert("epsilon".to_owned(), bigmod::random_bits(rng, product_bits)?);
    randomizers.insert("zeta".to_owned(), bigmod::random_bits(rng, product_bits)?);

    let commit = ProofCommit {
        u: witness.u.clone(),
        e: witness.e.clone(),
        r1,
        r2,
        v,
        w,
        randomizers,
        c_u,
        c_r,
        signed_accumulator: witness.signed_accumulator.clone(),
    };
    let commitments = commit.commitments(pk)?;
    Ok((commitments, commit))
}

impl ProofCommit {
    /// The current commitment list `[C_u, C_r, T1, T2, T3]`.
    fn commitments(&self, pk: &PublicKey) -> Result<Vec<BigInt>, Error> {
        let n = pk.n();
        let rnd = |name: &str| &self.randomizers[name];
        let t1 = bigmod::mod_pow(pk.z(), rnd("beta"), n)?
            * bigmod::mod_pow(pk.s(), rnd("delta"), n)?
            % n;
        let t2 = bigmod::mod_pow(&self.c_r, rnd("alpha"), n)?
            * bigmod::mod_pow(pk.z(), &-rnd("epsilon"), n)?
            % n
            * bigmod::mod_pow(pk.s(), &-rnd("zeta"), n)?
            % n;
        let t3 = bigmod::mod_pow(&self.c_u, rnd("alpha"), n)?
            * bigmod::mod_pow(pk.s(), &-rnd("epsilon"), n)?
            % n;
        Ok(vec![
            self.c_u.clone(),
            self.c_r.clone(),
            t1,
            t2,
            t3,
        ])
    }

    /// Recomputes the witness-dependent entries of `commitments` in place
    /// after the witness moved to a newer accumulator.
    ///
    /// Only `C_u` and `T3` depend on `u`; the blinding exponents and the
    /// shared `alpha` randomizer are kept, preserving the linkage with the
    /// main proof.
    pub fn update(
        &mut self,
        pk: &PublicKey,
        commitments: &mut [BigInt],
        witness: &Witness,
    ) -> Result<(), Error> {
        if commitments.len() < 5 {
            return Err(Error::CryptoParameterMismatch);
        }
        let n = pk.n();
        self.u = witness.u.clone();
        self.signed_accumulator = witness.signed_accumulator.clone();
        self.c_u = &self.u * bigmod::mod_pow(pk.s(), &self.r1, n)? % n;
        let t3 = bigmod::mod_pow(&self.c_u, &self.randomizers["alpha"], n)?
            * bigmod::mod_pow(pk.s(), &-&self.randomizers["epsilon"], n)?
            % n;
        commitments[0] = self.c_u.clone();
        commitments[4] = t3;
        Ok(())
    }

    /// Answers the challenge with the five named responses, computed over
    /// the integers.
    pub fn build_proof(&self, challenge: &BigInt) -> Proof {
        let secrets = [
            ("alpha", &self.e),
            ("beta", &self.r1),
            ("delta", &self.r2),
            ("epsilon", &self.v),
            ("zeta", &self.w),
        ];
        let responses = secrets
            .into_iter()
            .map(|(name, secret)| {
                (
                    name.to_owned(),
                    &self.randomizers[name] + challenge * secret,
                )
            })
            .collect();
        Proof {
            c_u: self.c_u.clone(),
            c_r: self.c_r.clone(),
            signed_accumulator: self.signed_accumulator.clone(),
            responses,
        }
    }
}

/// Single-use commit/response object for one non-revocation proof.
///
/// The embedded randomizer must never answer two different challenges;
/// credential code enforces this by taking builders out of the cache before
/// use and never putting a taken builder back.
pub struct NonRevocationProofBuilder {
    pk: PublicKey,
    witness: Witness,
    randomizer: BigInt,
    index: u64,
    commit: Option<ProofCommit>,
    commitments: Vec<BigInt>,
}

impl NonRevocationProofBuilder {
    /// Binds a builder to a witness and an `"alpha"` randomizer.
    pub fn new(pk: PublicKey, witness: Witness, randomizer: BigInt) -> NonRevocationProofBuilder {
        let index = witness.index();
        NonRevocationProofBuilder {
            pk,
            witness,
            randomizer,
            index,
            commit: None,
            commitments: Vec::new(),
        }
    }

    /// The shared `"alpha"` randomizer.
    pub fn randomizer(&self) -> &BigInt {
        &self.randomizer
    }

    /// The accumulator epoch the commitments are valid against.
    pub fn accumulator_index(&self) -> u64 {
        self.index
    }

    /// Computes the commitment list on first call; later calls return the
    /// cached list.
    pub fn commit<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<Vec<BigInt>, Error> {
        if self.commit.is_none() {
            let (commitments, commit) =
                new_proof_commit(rng, &self.pk, &self.witness, &self.randomizer)?;
            self.commitments = commitments;
            self.commit = Some(commit);
        }
        Ok(self.commitments.clone())
    }

    /// Re-derives the commitments against a newer witness.
    ///
    /// A witness at the builder's epoch or older is a no-op. Calling this
    /// before [`commit`](Self::commit) is an error.
    pub fn update_commit(&mut self, witness: &Witness) -> Result<(), Error> {
        let commit = self.commit.as_mut().ok_or(Error::UninitializedBuilder)?;
        if witness.index() <= self.index {
            return Ok(());
        }
        commit.update(&self.pk, &mut self.commitments, witness)?;
        self.witness = witness.clone();
        self.index = witness.index();
        Ok(())
    }

    /// Builds the sub-proof for the challenge.
    pub fn create_proof(&self, challenge: &BigInt) -> Result<Proof, Error> {
        let commit = self.commit.as_ref().ok_or(Error::UninitializedBuilder)?;
        Ok(commit.build_proof(challenge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;
    use rand::thread_rng;

    const RESPONSE_NAMES: [&str; 5] = ["alpha", "beta", "delta", "epsilon", "zeta"];

    // A tiny group, big enough to exercise the algebra.
    fn test_key() -> PublicKey {
        let params = crate::PARAMS_1024;
        let n = BigInt::from(7919u32) * BigInt::from(7927u32);
        PublicKey::new(
            params,
            n,
            BigInt::from(1234u32),
            BigInt::from(4321u32),
            vec![BigInt::from(99u32)],
        )
        .unwrap()
    }

    fn test_witness(pk: &PublicKey, index: u64) -> Witness {
        let u = BigInt::from(42u32);
        let e = BigInt::from(101u32);
        let nu = bigmod::mod_pow(&u, &e, pk.n()).unwrap();
        Witness {
            u,
            e,
            signed_accumulator: SignedAccumulator {
                accumulator: Accumulator { nu, index },
            },
        }
    }

    #[test]
    fn responses_carry_all_five_names() {
        let mut rng = thread_rng();
        let pk = test_key();
        let witness = test_witness(&pk, 0);
        let randomizer = new_proof_randomizer(&mut rng, pk.params()).unwrap();
        let mut builder = NonRevocationProofBuilder::new(pk, witness, randomizer);
        let commitments = builder.commit(&mut rng).unwrap();
        assert_eq!(commitments.len(), 5);
        let proof = builder.create_proof(&BigInt::from(17u32)).unwrap();
        for name in RESPONSE_NAMES {
            assert!(proof.responses.contains_key(name));
        }
    }

    #[test]
    fn commit_is_cached() {
        let mut rng = thread_rng();
        let pk = test_key();
        let witness = test_witness(&pk, 0);
        let randomizer = new_proof_randomizer(&mut rng, pk.params()).unwrap();
        let mut builder = NonRevocationProofBuilder::new(pk, witness, randomizer);
        let first = builder.commit(&mut rng).unwrap();
        let second = builder.commit(&mut rng).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_before_commit_is_rejected() {
        let mut rng = thread_rng();
        let pk = test_key();
        let witness = test_witness(&pk, 0);
        let newer = test_witness(&pk, 1);
        let randomizer = new_proof_randomizer(&mut rng, pk.params()).unwrap();
        let mut builder = NonRevocationProofBuilder::new(pk, witness, randomizer);
        assert_eq!(
            builder.update_commit(&newer),
            Err(Error::UninitializedBuilder)
        );
    }

    #[test]
    fn update_with_stale_witness_is_a_noop() {
        let mut rng = thread_rng();
        let pk = test_key();
        let witness = test_witness(&pk, 3);
        let randomizer = new_proof_randomizer(&mut rng, pk.params()).unwrap();
        let mut builder = NonRevocationProofBuilder::new(pk.clone(), witness.clone(), randomizer);
        let before = builder.commit(&mut rng).unwrap();
        builder.update_commit(&test_witness(&pk, 3)).unwrap();
        builder.update_commit(&test_witness(&pk, 1)).unwrap();
        assert_eq!(builder.commit(&mut rng).unwrap(), before);
        assert_eq!(builder.accumulator_index(), 3);
    }

    #[test]
    fn update_with_newer_witness_advances_the_epoch() {
        let mut rng = thread_rng();
        let pk = test_key();
        let witness = test_witness(&pk, 0);
        let randomizer = new_proof_randomizer(&mut rng, pk.params()).unwrap();
        let mut builder = NonRevocationProofBuilder::new(pk.clone(), witness, randomizer);
        let before = builder.commit(&mut rng).unwrap();

        let mut newer = test_witness(&pk, 7);
        newer.u = BigInt::from(55u32);
        newer.signed_accumulator.accumulator.nu =
            bigmod::mod_pow(&newer.u, &newer.e, pk.n()).unwrap();
        builder.update_commit(&newer).unwrap();

        let after = builder.commit(&mut rng).unwrap();
        assert_eq!(builder.accumulator_index(), 7);
        assert_ne!(before[0], after[0]);
        // Blinding-only entries are untouched.
        assert_eq!(before[1], after[1]);
        assert_eq!(before[2], after[2]);
        assert_eq!(before[3], after[3]);
    }

    #[test]
    fn reconstruction_matches_commitments() {
        let mut rng = thread_rng();
        let pk = test_key();
        let witness = test_witness(&pk, 0);
        let randomizer = new_proof_randomizer(&mut rng, pk.params()).unwrap();
        let mut builder = NonRevocationProofBuilder::new(pk.clone(), witness.clone(), randomizer);
        let commitments = builder.commit(&mut rng).unwrap();

        let challenge = BigInt::one() << 128;
        let proof = builder.create_proof(&challenge).unwrap();
        let alpha = proof.responses["alpha"].clone();
        let reconstructed = proof.reconstruct(&pk, &challenge, &alpha).unwrap();
        assert_eq!(commitments, reconstructed);
    }
}
