//! Field element helpers for the STARK prime field.
//!
//! Proof words travel as 256-bit integers; the hasher works on `FieldElement`.
//! Conversion is checked: a word at or above the prime never reaches the hasher.

use alloy_primitives::U256;
use starknet_ff::FieldElement;

/// The STARK prime `2^251 + 17 * 2^192 + 1`.
pub const FIELD_PRIME: U256 = U256::from_limbs([1, 0, 0, 0x0800_0000_0000_0011]);

/// Low 252 bits set.
pub const MASK_252: U256 = U256::from_limbs([u64::MAX, u64::MAX, u64::MAX, 0x0fff_ffff_ffff_ffff]);

/// Whether `value` is a canonical field element.
#[inline]
pub fn is_field_element(value: &U256) -> bool {
    *value < FIELD_PRIME
}

/// Convert a word into a field element, `None` if it is not below the prime.
pub fn to_felt(value: &U256) -> Option<FieldElement> {
    if !is_field_element(value) {
        return None;
    }
    FieldElement::from_bytes_be(&value.to_be_bytes::<32>()).ok()
}

pub fn from_felt(felt: &FieldElement) -> U256 {
    U256::from_be_bytes(felt.to_bytes_be())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_boundary() {
        let below = FIELD_PRIME - U256::from(1u64);
        assert!(is_field_element(&below));
        assert!(!is_field_element(&FIELD_PRIME));
        assert!(to_felt(&FIELD_PRIME).is_none());
        assert!(to_felt(&MASK_252).is_none());
    }

    #[test]
    fn test_felt_conversion_preserves_value() {
        let value: U256 = U256::from(0x1234_5678_9abc_def0u64) << 180;
        let felt = to_felt(&value).unwrap();
        assert_eq!(from_felt(&felt), value);
    }

    #[test]
    fn test_mask_covers_prime() {
        assert_eq!(FIELD_PRIME & MASK_252, FIELD_PRIME);
        assert_eq!(MASK_252 >> 252, U256::ZERO);
    }
}
