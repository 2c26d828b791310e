//! Two-input hash over the STARK field.
//!
//! ```text
//! H(a, b) = [shift + a_low·P0 + a_high·P1 + b_low·P2 + b_high·P3].x
//! ```
//!
//! The vault tree is committed under this Pedersen variant. It is not commutative,
//! so node order inside a proof row is significant.

use starknet_ff::FieldElement;

/// A deterministic hash of two field elements.
pub trait FieldHasher {
    fn hash(&self, a: &FieldElement, b: &FieldElement) -> FieldElement;
}

/// Pedersen hash backed by the precomputed point tables in `starknet-crypto`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PedersenHasher;

impl FieldHasher for PedersenHasher {
    #[inline]
    fn hash(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        starknet_crypto::pedersen_hash(a, b)
    }
}

impl<H: FieldHasher + ?Sized> FieldHasher for &H {
    #[inline]
    fn hash(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        (**self).hash(a, b)
    }
}
