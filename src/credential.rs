// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Credentials and the non-revocation builder cache.
//!
//! The cache is a single-slot mailbox with take-or-skip, fill-or-discard
//! discipline. Taking is non-blocking; a taken builder is never put back;
//! an offer to an occupied slot drops the offered builder. Together this
//! gives a hard at-most-once guarantee for the revocation randomizer bound
//! to each builder: losing a racily prepared builder is acceptable,
//! answering two challenges with one randomizer is not.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use num_bigint::BigInt;
use rand_core::{CryptoRng, RngCore};

use crate::disclosure::{DisclosureProofBuilder, ProofD};
use crate::proof::{create_challenge, SECRETKEY_RANDOMIZER};
use crate::rangeproof::Statement;
use crate::revocation::{self, NonRevocationProofBuilder, Witness};
use crate::{bigmod, CLSignature, Error, PublicKey};

/// The single-slot builder cache.
struct BuilderSlot(Mutex<Option<NonRevocationProofBuilder>>);

impl BuilderSlot {
    fn empty() -> BuilderSlot {
        BuilderSlot(Mutex::new(None))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<NonRevocationProofBuilder>> {
        // A panic while holding the slot leaves no torn state; take the
        // inner value regardless.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Non-blocking take.
    fn take(&self) -> Option<NonRevocationProofBuilder> {
        self.lock().take()
    }

    /// Non-blocking put; drops `builder` when the slot is already full.
    fn offer(&self, builder: NonRevocationProofBuilder) {
        let mut slot = self.lock();
        if slot.is_none() {
            *slot = Some(builder);
        }
    }
}

/// A CL-signed credential: the signature, the ordered attribute block, and
/// optionally a non-revocation witness.
///
/// Attribute 0 is conventionally the user secret. Multiple disclosure
/// proofs may be constructed concurrently from one credential; the only
/// shared mutable state is the builder cache.
pub struct Credential {
    pk: PublicKey,
    signature: CLSignature,
    attributes: Vec<BigInt>,
    witness: Option<Witness>,
    nonrev_cache: BuilderSlot,
}

impl Credential {
    /// Assembles a credential, checking that the key carries a base for
    /// every attribute.
    pub fn new(
        pk: PublicKey,
        signature: CLSignature,
        attributes: Vec<BigInt>,
        witness: Option<Witness>,
    ) -> Result<Credential, Error> {
        if attributes.len() > pk.attribute_bases().len() {
            return Err(Error::CryptoParameterMismatch);
        }
        Ok(Credential {
            pk,
            signature,
            attributes,
            witness,
            nonrev_cache: BuilderSlot::empty(),
        })
    }

    /// The public key the credential was issued under.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// The CL signature over the attribute block.
    pub fn signature(&self) -> &CLSignature {
        &self.signature
    }

    /// The ordered attribute block.
    pub fn attributes(&self) -> &[BigInt] {
        &self.attributes
    }

    /// The non-revocation witness, if the credential is revocation-enabled.
    pub fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }

    /// Starts a disclosure proof: discloses `disclosed`, hides the rest,
    /// optionally binds range statements and a non-revocation proof.
    pub fn create_disclosure_proof_builder<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        disclosed: &[usize],
        range_statements: Option<&BTreeMap<usize, Vec<Statement>>>,
        nonrev: bool,
    ) -> Result<DisclosureProofBuilder, Error> {
        DisclosureProofBuilder::new(rng, self, disclosed, range_statements, nonrev)
    }

    /// Runs the full build-commit-respond cycle for a single-credential
    /// proof under the transcript `(context, nonce)`.
    pub fn create_disclosure_proof<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        disclosed: &[usize],
        range_statements: Option<&BTreeMap<usize, Vec<Statement>>>,
        nonrev: bool,
        context: &BigInt,
        nonce: &BigInt,
    ) -> Result<ProofD, Error> {
        let mut builder =
            self.create_disclosure_proof_builder(rng, disclosed, range_statements, nonrev)?;
        let mut randomizers = HashMap::new();
        randomizers.insert(
            SECRETKEY_RANDOMIZER.to_owned(),
            bigmod::random_bits(rng, self.pk.params().l_m_commit)?,
        );
        let contributions = builder.commit(rng, &randomizers)?;
        let challenge = create_challenge(context, nonce, &contributions, false);
        builder.create_proof(&challenge)
    }

    /// The epoch of the accumulator the witness was last updated to.
    pub fn nonrev_index(&self) -> Result<u64, Error> {
        Ok(self.witness.as_ref().ok_or(Error::MissingWitness)?.index())
    }

    /// Prepares a committed non-revocation builder in the background slot,
    /// so the next disclosure proof skips the expensive initial commit.
    ///
    /// Idempotent: an already-cached builder is refreshed against the
    /// current witness and put back. When a concurrent preparer fills the
    /// slot in the meantime, the refreshed builder is dropped; the slot's
    /// occupant is never older than the witness it was prepared from.
    pub fn nonrev_prepare_cache<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<(), Error> {
        let witness = self.witness.as_ref().ok_or(Error::MissingWitness)?;
        let builder = match self.nonrev_cache.take() {
            Some(mut builder) => {
                builder.update_commit(witness)?;
                builder
            }
            None => {
                let mut builder = self.new_nonrev_builder(rng, witness)?;
                builder.commit(rng)?;
                builder
            }
        };
        self.nonrev_cache.offer(builder);
        Ok(())
    }

    /// Hands out a builder for one proof: the cached one when present
    /// (updated to the current witness), a freshly constructed one
    /// otherwise. Never blocks; never hands out the same builder twice.
    pub(crate) fn consume_nonrev_builder<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<NonRevocationProofBuilder, Error> {
        let witness = self.witness.as_ref().ok_or(Error::MissingWitness)?;
        match self.nonrev_cache.take() {
            Some(mut builder) => {
                builder.update_commit(witness)?;
                Ok(builder)
            }
            None => self.new_nonrev_builder(rng, witness),
        }
    }

    fn new_nonrev_builder<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        witness: &Witness,
    ) -> Result<NonRevocationProofBuilder, Error> {
        let randomizer = revocation::new_proof_randomizer(rng, self.pk.params())?;
        Ok(NonRevocationProofBuilder::new(
            self.pk.clone(),
            witness.clone(),
            randomizer,
        ))
    }
}
