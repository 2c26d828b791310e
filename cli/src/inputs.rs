//! Parsing of command-line values and proof files.

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result, anyhow};
use exodus_core::{NATIVE_ASSET, Role};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Decimal or `0x` hex.
pub fn parse_u256(value: &str) -> Result<U256> {
    U256::from_str(value.trim()).with_context(|| format!("Invalid number: {value}"))
}

pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("Invalid address: {value}"))
}

/// Like `parse_address`, but `native` names the native asset.
pub fn parse_asset(value: &str) -> Result<Address> {
    if value.eq_ignore_ascii_case("native") {
        return Ok(NATIVE_ASSET);
    }
    parse_address(value)
}

pub fn parse_b256(value: &str) -> Result<B256> {
    B256::from_str(value.trim()).with_context(|| format!("Invalid 32-byte value: {value}"))
}

pub fn parse_role(value: &str) -> Result<Role> {
    Role::from_str(value).map_err(|e| anyhow!(e))
}

pub fn parse_hex_bytes(value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped).with_context(|| format!("Invalid hex payload: {value}"))
}

fn read_words(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read proof file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Proof file must be a JSON array of strings: {}", path.display()))
}

/// Read a vault proof: a JSON array of words.
pub fn read_vault_proof(path: &Path) -> Result<Vec<U256>> {
    read_words(path)?
        .iter()
        .enumerate()
        .map(|(i, w)| parse_u256(w).with_context(|| format!("word {i}")))
        .collect()
}

/// Read an account proof: a JSON array of 32-byte hex siblings.
pub fn read_account_proof(path: &Path) -> Result<Vec<B256>> {
    read_words(path)?
        .iter()
        .enumerate()
        .map(|(i, w)| parse_b256(w).with_context(|| format!("sibling {i}")))
        .collect()
}
