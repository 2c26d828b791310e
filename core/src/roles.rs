//! Role-based capabilities
//!
//! Each role is an independent grant; holding `Admin` does not imply any other role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pause,
    Unpause,
    Disburse,
    SetAccountRoot,
    SetVaultRoot,
    ManageTokenMappings,
    /// Grants and revokes roles, toggles root overrides
    Admin,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Pause,
        Role::Unpause,
        Role::Disburse,
        Role::SetAccountRoot,
        Role::SetVaultRoot,
        Role::ManageTokenMappings,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pause => "pause",
            Role::Unpause => "unpause",
            Role::Disburse => "disburse",
            Role::SetAccountRoot => "set_account_root",
            Role::SetVaultRoot => "set_vault_root",
            Role::ManageTokenMappings => "manage_token_mappings",
            Role::Admin => "admin",
        }
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}

/// Set of roles held by one address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub fn from_bits(bits: u8) -> Self {
        RoleSet(bits & Self::all().0)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn all() -> Self {
        Role::ALL.into_iter().collect()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}
