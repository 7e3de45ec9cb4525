#![doc(html_root_url = "https://docs.rs/clproof/0.1.0")]
#![deny(missing_docs)]

//! A prover core for Camenisch-Lysyanskaya selective-disclosure
//! credentials.
//!
//! Given a CL signature on a block of attributes, a [`Credential`] produces
//! a non-interactive zero-knowledge [`ProofD`] that reveals a chosen subset
//! of the attributes and hides the remainder, optionally combined with
//! per-attribute range statements and a non-revocation proof, all answering
//! a single Fiat-Shamir challenge.
//!
//! ```no_run
//! use clproof::{generate_key_pair, CLSignature, Credential};
//! use num_bigint::BigInt;
//!
//! # fn main() -> Result<(), clproof::Error> {
//! let mut rng = rand::thread_rng();
//! let (pk, sk) = generate_key_pair(&mut rng, 1024, 3)?;
//!
//! let attributes = vec![
//!     clproof::generate_secret_attribute(&mut rng)?,
//!     BigInt::from(1948u32),
//!     BigInt::from(512u32),
//! ];
//! let signature = CLSignature::sign(&mut rng, &sk, &pk, &attributes)?;
//! let credential = Credential::new(pk.clone(), signature, attributes, None)?;
//!
//! let context = BigInt::from(1u32);
//! let nonce = BigInt::from(0x1122334455u64);
//! let proof = credential.create_disclosure_proof(
//!     &mut rng,
//!     &[1], // disclose attribute 1, hide the secret and attribute 2
//!     None,
//!     false,
//!     &context,
//!     &nonce,
//! )?;
//! assert!(proof.verify(&pk, &context, &nonce, None, None)?);
//! # Ok(())
//! # }
//! ```

pub mod bigmod;
mod credential;
mod disclosure;
mod error;
mod keys;
mod params;
mod proof;
pub mod rangeproof;
pub mod revocation;
mod signature;

pub use credential::Credential;
pub use disclosure::{DisclosureProofBuilder, ProofD, ProofPCommitment};
pub use error::Error;
pub use keys::{generate_key_pair, PublicKey, SecretKey};
pub use params::{
    generate_secret_attribute, SystemParameters, PARAMS_1024, PARAMS_2048, PARAMS_4096,
};
pub use proof::{create_challenge, verify_proof_list, ProofBuilderList, SECRETKEY_RANDOMIZER};
pub use signature::CLSignature;
