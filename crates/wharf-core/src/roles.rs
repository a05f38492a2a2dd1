//! Admin/minter capability table
//!
//! A single authorization table keyed by identity, with one bit per
//! capability. Grants and revocations require the admin capability; the
//! bootstrap admin is fixed when the table is created.

use crate::address::Address;
use crate::error::{CoreResult, LedgerError};
use std::collections::HashMap;

/// Capabilities recognized by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Minter,
}

impl Role {
    fn mask(self) -> u8 {
        match self {
            Role::Admin => 1 << 0,
            Role::Minter => 1 << 1,
        }
    }
}

/// Identity -> granted-capability bitmask.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    grants: HashMap<Address, u8>,
}

impl RoleTable {
    /// Create a table with `admin` holding the admin capability.
    pub fn new(admin: Address) -> Self {
        let mut grants = HashMap::new();
        grants.insert(admin, Role::Admin.mask());
        Self { grants }
    }

    pub fn has(&self, who: Address, role: Role) -> bool {
        self.grants
            .get(&who)
            .is_some_and(|bits| bits & role.mask() != 0)
    }

    /// Grant `role` to `who`. Admin-gated.
    pub fn grant(&mut self, caller: Address, who: Address, role: Role) -> CoreResult<()> {
        self.require_admin(caller)?;
        *self.grants.entry(who).or_default() |= role.mask();
        Ok(())
    }

    /// Revoke `role` from `who`. Admin-gated.
    pub fn revoke(&mut self, caller: Address, who: Address, role: Role) -> CoreResult<()> {
        self.require_admin(caller)?;
        if let Some(bits) = self.grants.get_mut(&who) {
            *bits &= !role.mask();
            if *bits == 0 {
                self.grants.remove(&who);
            }
        }
        Ok(())
    }

    pub fn require_admin(&self, caller: Address) -> CoreResult<()> {
        if !self.has(caller, Role::Admin) {
            return Err(LedgerError::NotAdmin { caller });
        }
        Ok(())
    }

    pub fn require_minter(&self, caller: Address) -> CoreResult<()> {
        if !self.has(caller, Role::Minter) {
            return Err(LedgerError::NotMinter { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address([n; 20])
    }

    #[test]
    fn test_bootstrap_admin() {
        let table = RoleTable::new(addr(1));
        assert!(table.has(addr(1), Role::Admin));
        assert!(!table.has(addr(1), Role::Minter));
    }

    #[test]
    fn test_grant_requires_admin() {
        let mut table = RoleTable::new(addr(1));
        let err = table.grant(addr(2), addr(3), Role::Minter).unwrap_err();
        assert_eq!(err, LedgerError::NotAdmin { caller: addr(2) });

        table.grant(addr(1), addr(3), Role::Minter).unwrap();
        assert!(table.has(addr(3), Role::Minter));
    }

    #[test]
    fn test_revoke_clears_capability() {
        let mut table = RoleTable::new(addr(1));
        table.grant(addr(1), addr(3), Role::Minter).unwrap();
        table.revoke(addr(1), addr(3), Role::Minter).unwrap();
        assert!(!table.has(addr(3), Role::Minter));
        assert!(table.require_minter(addr(3)).is_err());
    }
}
