// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

//! Selective-disclosure proofs over a CL-signed attribute block.
//!
//! A [`DisclosureProofBuilder`] lives for exactly one proof and moves
//! through three ordered phases: construction (signature randomisation and
//! randomizer sampling), [`commit`](DisclosureProofBuilder::commit)
//! (emission of the ordered commitment list that feeds the Fiat-Shamir
//! transcript), and [`create_proof`](DisclosureProofBuilder::create_proof)
//! (the integer Schnorr responses). The emission order of commitments is
//! part of the protocol: `[A', Z]`, then the non-revocation contributions,
//! then the range contributions in ascending attribute index, statements in
//! input order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use num_bigint::BigInt;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};

use crate::credential::Credential;
use crate::proof::{create_challenge, SECRETKEY_RANDOMIZER};
use crate::rangeproof::{self, ProofStructure, RangeCommit, Statement};
use crate::revocation::{self, NonRevocationProofBuilder};
use crate::signature::message_representative;
use crate::{bigmod, CLSignature, Error, PublicKey};

/// A keyshare server's contribution to the commitment phase.
///
/// `P` is the server's share of the signed block; `P_commit` is its Schnorr
/// commitment, merged into the builder's commitment accumulator so the
/// final proof covers both halves of the split secret.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProofPCommitment {
    /// The server's public contribution `P`.
    pub p: BigInt,
    /// The server's commitment to its share of the secret.
    pub p_commit: BigInt,
}

/// A non-interactive selective-disclosure proof.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProofD {
    /// The Fiat-Shamir challenge the responses answer.
    pub c: BigInt,
    /// The randomised signature element `A'`.
    pub a: BigInt,
    /// Response for the signature exponent, offset by `2^(Le-1)`.
    pub e_response: BigInt,
    /// Response for the blinding exponent `v'`.
    pub v_response: BigInt,
    /// Responses for the undisclosed attributes, by index.
    pub a_responses: BTreeMap<usize, BigInt>,
    /// The disclosed attributes, by index.
    pub a_disclosed: BTreeMap<usize, BigInt>,
    /// The non-revocation sub-proof, with its `"alpha"` response removed.
    pub nonrev_proof: Option<revocation::Proof>,
    /// Range sub-proofs, by attribute index, in statement input order.
    pub range_proofs: BTreeMap<usize, Vec<rangeproof::Proof>>,
}

/// The single-proof state machine producing a [`ProofD`].
pub struct DisclosureProofBuilder {
    pk: PublicKey,
    attributes: Vec<BigInt>,
    randomized: CLSignature,
    e_commit: BigInt,
    v_commit: BigInt,
    // Commitment accumulator; collects keyshare P_commit merges before the
    // main commitment is multiplied in.
    z: BigInt,
    disclosed: BTreeSet<usize>,
    undisclosed: BTreeSet<usize>,
    attr_randomizers: HashMap<usize, BigInt>,
    nonrev_builder: Option<NonRevocationProofBuilder>,
    nonrev_attr: Option<usize>,
    rp_structures: BTreeMap<usize, Vec<ProofStructure>>,
    rp_commits: BTreeMap<usize, Vec<(Vec<BigInt>, RangeCommit)>>,
}

impl DisclosureProofBuilder {
    /// Randomises the credential's signature and samples all per-session
    /// randomizers; obtains a non-revocation builder from the credential's
    /// cache when `nonrev` is set.
    pub(crate) fn new<R: RngCore + CryptoRng>(
        rng: &mut R,
        credential: &Credential,
        disclosed: &[usize],
        range_statements: Option<&BTreeMap<usize, Vec<Statement>>>,
        nonrev: bool,
    ) -> Result<DisclosureProofBuilder, Error> {
        let pk = credential.public_key().clone();
        let params = *pk.params();
        let attributes = credential.attributes().to_vec();

        let disclosed: BTreeSet<usize> = disclosed.iter().copied().collect();
        if disclosed.iter().any(|&i| i >= attributes.len()) {
            return Err(Error::CryptoParameterMismatch);
        }
        let undisclosed: BTreeSet<usize> =
            (0..attributes.len()).filter(|i| !disclosed.contains(i)).collect();

        let randomized = credential.signature().randomize(rng, &pk)?;
        let e_commit = bigmod::random_bits(rng, params.l_e_commit)?;
        let v_commit = bigmod::random_bits(rng, params.l_v_commit)?;

        let mut attr_randomizers = HashMap::new();
        for &i in &undisclosed {
            attr_randomizers.insert(i, bigmod::random_bits(rng, params.l_m_commit)?);
        }

        let mut rp_structures = BTreeMap::new();
        if let Some(statements) = range_statements {
            for (&index, statements) in statements {
                if disclosed.contains(&index) {
                    return Err(Error::RangeOnDisclosedAttribute(index));
                }
                if index >= attributes.len() {
                    return Err(Error::CryptoParameterMismatch);
                }
                let structures: Vec<ProofStructure> = statements
                    .iter()
                    .map(|statement| statement.proof_structure(index))
                    .collect();
                rp_structures.insert(index, structures);
            }
        }

        let mut nonrev_builder = None;
        let mut nonrev_attr = None;
        if nonrev {
            let witness = credential.witness().ok_or(Error::MissingWitness)?;
            let index = attributes
                .iter()
                .position(|m| m == &witness.e)
                .ok_or(Error::RevocationAttributeMissing)?;
            if disclosed.contains(&index) || rp_structures.contains_key(&index) {
                // The revocation randomizer is single-purpose; disclosing the
                // attribute or binding a range statement to it would reuse it.
                return Err(Error::CryptoParameterMismatch);
            }
            let builder = credential.consume_nonrev_builder(rng)?;
            attr_randomizers.insert(index, builder.randomizer().clone());
            nonrev_builder = Some(builder);
            nonrev_attr = Some(index);
        }

        Ok(DisclosureProofBuilder {
            pk,
            attributes,
            randomized,
            e_commit,
            v_commit,
            z: BigInt::one(),
            disclosed,
            undisclosed,
            attr_randomizers,
            nonrev_builder,
            nonrev_attr,
            rp_structures,
            rp_commits: BTreeMap::new(),
        })
    }

    /// The public key the proof is constructed against.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// The attribute index linked to the non-revocation proof, when one is
    /// being built.
    pub fn nonrev_attribute(&self) -> Option<usize> {
        self.nonrev_attr
    }

    /// Multiplies a keyshare server's commitment into the accumulator.
    ///
    /// Must happen before [`commit`](Self::commit) for the contribution to
    /// reach the transcript.
    pub fn merge_proof_p_commitment(&mut self, pcomm: &ProofPCommitment) {
        self.z = &self.z * &pcomm.p_commit % self.pk.n();
    }

    /// Emits the ordered commitment contribution list.
    ///
    /// `randomizers` must contain the `"secretkey"` entry, which overrides
    /// the randomizer of attribute 0 so that several builders can prove a
    /// shared user secret.
    pub fn commit<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        randomizers: &HashMap<String, BigInt>,
    ) -> Result<Vec<BigInt>, Error> {
        let sk_randomizer = randomizers
            .get(SECRETKEY_RANDOMIZER)
            .ok_or(Error::MissingRandomizer(SECRETKEY_RANDOMIZER))?;
        self.attr_randomizers.insert(0, sk_randomizer.clone());

        let n = self.pk.n();
        let mut z = &self.z * bigmod::mod_pow(&self.randomized.a, &self.e_commit, n)? % n;
        z = z * bigmod::mod_pow(self.pk.s(), &self.v_commit, n)? % n;
        for &i in &self.undisclosed {
            let base = self.pk.base(i).ok_or(Error::CryptoParameterMismatch)?;
            z = z * bigmod::mod_pow(base, &self.attr_randomizers[&i], n)? % n;
        }

        let mut contributions = vec![self.randomized.a.clone(), z];

        if let Some(builder) = self.nonrev_builder.as_mut() {
            contributions.extend(builder.commit(rng)?);
        }

        for (&index, structures) in &self.rp_structures {
            if !self.rp_commits.contains_key(&index) {
                let m = message_representative(&self.attributes[index], self.pk.params().l_m);
                let randomizer = &self.attr_randomizers[&index];
                let mut commits = Vec::with_capacity(structures.len());
                for structure in structures {
                    commits.push(structure.commitments_from_secrets(rng, &self.pk, &m, randomizer)?);
                }
                self.rp_commits.insert(index, commits);
            }
            for (contribution, _) in &self.rp_commits[&index] {
                contributions.extend(contribution.iter().cloned());
            }
        }

        Ok(contributions)
    }

    /// Computes the Schnorr responses for the challenge and assembles the
    /// final proof.
    ///
    /// Response arithmetic is over the integers; the `2^(Le-1)` offset on
    /// `e` keeps the transmitted response at commitment size while leaving
    /// verification exact.
    pub fn create_proof(&self, challenge: &BigInt) -> Result<ProofD, Error> {
        let params = self.pk.params();

        let e_prime = &self.randomized.e - (BigInt::one() << (params.l_e - 1));
        let e_response = &self.e_commit + challenge * e_prime;
        let v_response = &self.v_commit + challenge * &self.randomized.v;

        let mut a_responses = BTreeMap::new();
        for &i in &self.undisclosed {
            let m = message_representative(&self.attributes[i], params.l_m);
            a_responses.insert(i, &self.attr_randomizers[&i] + challenge * m);
        }
        let a_disclosed: BTreeMap<usize, BigInt> = self
            .disclosed
            .iter()
            .map(|&i| (i, self.attributes[i].clone()))
            .collect();

        let nonrev_proof = match &self.nonrev_builder {
            Some(builder) => {
                let mut proof = builder.create_proof(challenge)?;
                // The verifier re-derives alpha from the main response on
                // the linked attribute.
                proof.responses.remove("alpha");
                Some(proof)
            }
            None => None,
        };

        let mut range_proofs = BTreeMap::new();
        for (&index, structures) in &self.rp_structures {
            let commits = self
                .rp_commits
                .get(&index)
                .ok_or(Error::UninitializedBuilder)?;
            let proofs = structures
                .iter()
                .zip(commits)
                .map(|(structure, (_, commit))| structure.build_proof(commit, challenge))
                .collect();
            range_proofs.insert(index, proofs);
        }

        Ok(ProofD {
            c: challenge.clone(),
            a: self.randomized.a.clone(),
            e_response,
            v_response,
            a_responses,
            a_disclosed,
            nonrev_proof,
            range_proofs,
        })
    }

    /// The contributions a timestamp server signs over: the randomised `A'`
    /// and one slot per attribute, disclosed slots filled, hidden slots
    /// zero.
    pub fn timestamp_request_contributions(&self) -> (BigInt, Vec<BigInt>) {
        let mut slots = vec![BigInt::from(0u32); self.attributes.len()];
        for &i in &self.disclosed {
            slots[i] = self.attributes[i].clone();
        }
        (self.randomized.a.clone(), slots)
    }
}

impl ProofD {
    /// Checks the proof against a transcript `(context, nonce)`.
    ///
    /// `range_statements` must repeat the statements the proof was built
    /// for, and `revocation_attr` must name the attribute linked to the
    /// non-revocation sub-proof, when those sub-proofs are present; both are
    /// verifier-side knowledge from the session request. Structural
    /// mismatches verify as `false`.
    pub fn verify(
        &self,
        pk: &PublicKey,
        context: &BigInt,
        nonce: &BigInt,
        range_statements: Option<&BTreeMap<usize, Vec<Statement>>>,
        revocation_attr: Option<usize>,
    ) -> Result<bool, Error> {
        match self.transcript_contributions(pk, range_statements, revocation_attr)? {
            Some(contributions) => {
                Ok(create_challenge(context, nonce, &contributions, false) == self.c)
            }
            None => Ok(false),
        }
    }

    /// Reconstructs this proof's commitment contributions from its
    /// responses; `None` flags a structural mismatch.
    pub(crate) fn transcript_contributions(
        &self,
        pk: &PublicKey,
        range_statements: Option<&BTreeMap<usize, Vec<Statement>>>,
        revocation_attr: Option<usize>,
    ) -> Result<Option<Vec<BigInt>>, Error> {
        let params = pk.params();
        let n = pk.n();

        let indices_valid = self
            .a_responses
            .keys()
            .chain(self.a_disclosed.keys())
            .all(|&i| i < pk.attribute_bases().len());
        let disjoint = self
            .a_disclosed
            .keys()
            .all(|i| !self.a_responses.contains_key(i));
        if !indices_valid || !disjoint {
            return Ok(None);
        }

        // Q = Z / (A'^(2^(Le-1)) * prod_D R_i^(m_i)), the statement the
        // responses answer for.
        let mut known = bigmod::mod_pow(&self.a, &(BigInt::one() << (params.l_e - 1)), n)?;
        for (&i, m) in &self.a_disclosed {
            let m = message_representative(m, params.l_m);
            known = known * bigmod::mod_pow(&pk.attribute_bases()[i], &m, n)? % n;
        }
        let q = pk.z() * bigmod::mod_inverse(&known, n)? % n;

        let mut z = bigmod::mod_pow(&q, &-&self.c, n)?
            * bigmod::mod_pow(&self.a, &self.e_response, n)?
            % n
            * bigmod::mod_pow(pk.s(), &self.v_response, n)?
            % n;
        for (&i, response) in &self.a_responses {
            z = z * bigmod::mod_pow(&pk.attribute_bases()[i], response, n)? % n;
        }

        let mut contributions = vec![self.a.clone(), z];

        if let Some(proof) = &self.nonrev_proof {
            let alpha = match revocation_attr.and_then(|i| self.a_responses.get(&i)) {
                Some(alpha) => alpha,
                None => return Ok(None),
            };
            contributions.extend(proof.reconstruct(pk, &self.c, alpha)?);
        }

        for (index, proofs) in &self.range_proofs {
            let statements = match range_statements.and_then(|map| map.get(index)) {
                Some(statements) if statements.len() == proofs.len() => statements,
                _ => return Ok(None),
            };
            for (statement, proof) in statements.iter().zip(proofs) {
                contributions.extend(proof.reconstruct(pk, statement, &self.c)?);
            }
        }

        Ok(Some(contributions))
    }
}
