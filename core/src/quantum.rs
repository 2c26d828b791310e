//! Conversion between quantized legacy balances and transferable amounts.

use alloy_primitives::U256;

use crate::errors::{Result, WithdrawalError};

/// Exclusive upper bound on a quantum.
pub const QUANTUM_UPPER_BOUND: U256 = U256::from_limbs([0, 0, 1, 0]);

#[inline]
pub fn is_valid_quantum(quantum: &U256) -> bool {
    !quantum.is_zero() && *quantum < QUANTUM_UPPER_BOUND
}

pub fn check_quantum(quantum: &U256) -> Result<()> {
    if !is_valid_quantum(quantum) {
        return Err(WithdrawalError::InvalidQuantum(*quantum));
    }
    Ok(())
}

/// `quantized * quantum`, rejecting overflow instead of wrapping.
pub fn dequantize(quantized: U256, quantum: U256) -> Result<U256> {
    check_quantum(&quantum)?;
    let overflow = WithdrawalError::QuantumOverflow { quantized, quantum };

    let amount = quantized.checked_mul(quantum).ok_or(overflow.clone())?;
    if amount / quantum != quantized {
        return Err(overflow);
    }
    Ok(amount)
}

/// `amount / quantum`, rejecting amounts that are not an exact multiple.
pub fn quantize(amount: U256, quantum: U256) -> Result<U256> {
    check_quantum(&quantum)?;
    if amount % quantum != U256::ZERO {
        return Err(WithdrawalError::InexactQuantization { amount, quantum });
    }
    Ok(amount / quantum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(!is_valid_quantum(&U256::ZERO));
        assert!(is_valid_quantum(&U256::from(1u64)));
        assert!(is_valid_quantum(&(QUANTUM_UPPER_BOUND - U256::from(1u64))));
        assert!(!is_valid_quantum(&QUANTUM_UPPER_BOUND));
        assert_eq!(QUANTUM_UPPER_BOUND, U256::from(1u64) << 128);
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (1u64, 1u64),
            (1_000, 10_000_000_000),
            (u64::MAX, 1),
            (123_456_789, 1_000_000),
        ];
        for (q, quantum) in cases {
            let q = U256::from(q);
            let quantum = U256::from(quantum);
            let amount = dequantize(q, quantum).unwrap();
            assert_eq!(amount / quantum, q);
            assert_eq!(quantize(amount, quantum).unwrap(), q);
        }
    }

    #[test]
    fn test_overflow_rejected() {
        let quantum = QUANTUM_UPPER_BOUND - U256::from(1u64);
        let quantized: U256 = U256::MAX >> 64;
        assert_eq!(
            dequantize(quantized, quantum),
            Err(WithdrawalError::QuantumOverflow { quantized, quantum })
        );
    }

    #[test]
    fn test_inexact_rejected() {
        assert_eq!(
            quantize(U256::from(1001u64), U256::from(10u64)),
            Err(WithdrawalError::InexactQuantization {
                amount: U256::from(1001u64),
                quantum: U256::from(10u64)
            })
        );
    }

    #[test]
    fn test_invalid_quantum() {
        assert_eq!(
            dequantize(U256::from(1u64), U256::ZERO),
            Err(WithdrawalError::InvalidQuantum(U256::ZERO))
        );
        assert!(quantize(U256::from(1u64), QUANTUM_UPPER_BOUND).is_err());
    }
}
