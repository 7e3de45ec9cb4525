// -*- mode: rust; -*-
//
// This file is part of clproof.
// See LICENSE for licensing information.

use thiserror::Error;

/// An error arising while constructing or checking a disclosure proof.
///
/// Every variant is fatal to the proof under construction: the caller
/// discards the builder and starts over. Errors from sub-proofs (range,
/// revocation) surface through the same enum, unchanged.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum Error {
    /// Incompatible key sizes or attribute counts.
    #[error("incompatible key parameters or attribute count")]
    CryptoParameterMismatch,
    /// A range statement addresses an attribute that is being disclosed.
    #[error("range statement on disclosed attribute {0}")]
    RangeOnDisclosedAttribute(usize),
    /// Non-revocation was requested but the credential carries no witness.
    #[error("credential has no non-revocation witness")]
    MissingWitness,
    /// No attribute of the credential equals the witness's revocation scalar.
    #[error("no attribute matches the revocation witness")]
    RevocationAttributeMissing,
    /// A commitment update was attempted before the initial commit.
    #[error("proof builder has not committed yet")]
    UninitializedBuilder,
    /// The operating system's CSPRNG failed to produce bytes.
    #[error("random number generator failure")]
    RandomnessFailure,
    /// A value was not invertible modulo `N`; only possible with malformed inputs.
    #[error("value is not invertible modulo N")]
    ModularInverseFailure,
    /// The search for a random prime exhausted its attempt budget.
    #[error("prime generation failed")]
    PrimeGenerationFailure,
    /// No system parameter set exists for the requested key length.
    #[error("unsupported key length {0}")]
    UnsupportedKeyLength(usize),
    /// `commit` was called without a mandatory externally supplied randomizer.
    #[error("missing externally supplied randomizer {0:?}")]
    MissingRandomizer(&'static str),
}
