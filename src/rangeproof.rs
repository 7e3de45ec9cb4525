// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Per-attribute range statements and their commitment structures.
//!
//! A [`Statement`] claims `factor * m - bound >= 0` for a hidden attribute
//! `m`. Its [`ProofStructure`] commits to the difference
//! `delta = factor * m - bound` under the key's bases and proves that the
//! commitment is consistent with the main disclosure proof, by answering the
//! challenge with the *same* Schnorr randomizer the main proof uses for `m`.
//! The inner positivity argument over the committed `delta` (the square
//! decomposition) is a separate construction layered on top of this
//! commitment and is out of scope here.

use num_bigint::BigInt;
use rand_core::{CryptoRng, RngCore};

use crate::{bigmod, Error, PublicKey};

/// A claim `factor * m - bound >= 0` about a hidden attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statement {
    /// Multiplier applied to the attribute.
    pub factor: u64,
    /// The bound subtracted from the scaled attribute.
    pub bound: BigInt,
}

impl Statement {
    /// A statement claiming `factor * m >= bound`.
    pub fn new(factor: u64, bound: BigInt) -> Statement {
        Statement { factor, bound }
    }

    /// Instantiates the commitment structure for the attribute at `index`.
    pub fn proof_structure(&self, index: usize) -> ProofStructure {
        ProofStructure {
            index,
            factor: self.factor,
            bound: self.bound.clone(),
        }
    }
}

/// The commitment structure of one range statement, bound to an attribute
/// index.
#[derive(Clone, Debug)]
pub struct ProofStructure {
    index: usize,
    factor: u64,
    bound: BigInt,
}

/// Secrets and randomizers a structure holds between commitment and
/// response.
#[derive(Clone, Debug)]
pub struct RangeCommit {
    c_delta: BigInt,
    m: BigInt,
    m_randomizer: BigInt,
    r: BigInt,
    rho: BigInt,
}

/// A completed range sub-proof.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proof {
    /// Commitment to `factor * m - bound`.
    pub c_delta: BigInt,
    /// Schnorr response for the attribute, equal to the main proof's
    /// response on the same index.
    pub m_response: BigInt,
    /// Schnorr response for the commitment randomness.
    pub r_response: BigInt,
}

impl ProofStructure {
    /// The attribute index this structure is bound to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Emits the commitment contributions `[C, T]` for this statement.
    ///
    /// `m_randomizer` must be the randomizer the main proof uses for this
    /// attribute; sharing it is what links the sub-proof to the disclosure
    /// proof.
    pub fn commitments_from_secrets<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        pk: &PublicKey,
        m: &BigInt,
        m_randomizer: &BigInt,
    ) -> Result<(Vec<BigInt>, RangeCommit), Error> {
        let params = pk.params();
        let delta = BigInt::from(self.factor) * m - &self.bound;
        let r = bigmod::random_bits(rng, params.l_ra)?;
        let rho = bigmod::random_bits(rng, params.l_ra + params.l_statzk + params.l_h)?;

        let c_delta =
            bigmod::mod_pow(pk.z(), &delta, pk.n())? * bigmod::mod_pow(pk.s(), &r, pk.n())? % pk.n();
        let t = bigmod::mod_pow(pk.z(), &(BigInt::from(self.factor) * m_randomizer), pk.n())?
            * bigmod::mod_pow(pk.s(), &rho, pk.n())?
            % pk.n();

        let commit = RangeCommit {
            c_delta: c_delta.clone(),
            m: m.clone(),
            m_randomizer: m_randomizer.clone(),
            r,
            rho,
        };
        Ok((vec![c_delta, t], commit))
    }

    /// Answers the challenge, consuming nothing: the commit object carries
    /// all per-session secrets.
    pub fn build_proof(&self, commit: &RangeCommit, challenge: &BigInt) -> Proof {
        Proof {
            c_delta: commit.c_delta.clone(),
            m_response: &commit.m_randomizer + challenge * &commit.m,
            r_response: &commit.rho + challenge * &commit.r,
        }
    }
}

impl Proof {
    /// Reconstructs the commitment contributions `[C, T]` from the responses
    /// and the challenge, for transcript recomputation by a verifier.
    pub fn reconstruct(
        &self,
        pk: &PublicKey,
        statement: &Statement,
        challenge: &BigInt,
    ) -> Result<Vec<BigInt>, Error> {
        let shifted = &self.c_delta * bigmod::mod_pow(pk.z(), &statement.bound, pk.n())? % pk.n();
        let t = bigmod::mod_pow(
            pk.z(),
            &(BigInt::from(statement.factor) * &self.m_response),
            pk.n(),
        )? * bigmod::mod_pow(pk.s(), &self.r_response, pk.n())?
            % pk.n();
        let t = t * bigmod::mod_pow(&shifted, &-challenge, pk.n())? % pk.n();
        Ok(vec![self.c_delta.clone(), t])
    }
}
