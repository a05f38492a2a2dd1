//! Fractional position ledger
//!
//! A single shared table of receipt positions with role-gated mint/burn,
//! owner-gated split/transfer, and per-owner delegate approval. Operations
//! are serialized by the caller (one `&mut self` at a time); each operation
//! validates everything before its first write, so a failure never leaves a
//! partial mutation. Multi-operation batches get the same all-or-nothing
//! guarantee through [`PositionLedger::transaction`].

use crate::address::Address;
use crate::error::{CoreResult, LedgerError};
use crate::events::LedgerEvent;
use crate::math::{mul_div_floor, WAD};
use crate::position::{Position, PositionId};
use crate::roles::{Role, RoleTable};
use ethnum::U256;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct PositionLedger {
    /// Live positions, keyed by id
    positions: BTreeMap<PositionId, Position>,

    /// Owner -> approved delegate (one per owner)
    approvals: HashMap<Address, Address>,

    /// Admin/minter capability table
    roles: RoleTable,

    /// Next id to assign; ids are never reused
    next_id: u64,

    /// Emitted events, drained by the embedding service
    events: Vec<LedgerEvent>,
}

impl PositionLedger {
    /// Create an empty ledger with `admin` holding the admin capability.
    pub fn new(admin: Address) -> Self {
        Self {
            positions: BTreeMap::new(),
            approvals: HashMap::new(),
            roles: RoleTable::new(admin),
            next_id: 1,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // Capability administration
    // ========================================================================

    pub fn grant_role(&mut self, caller: Address, who: Address, role: Role) -> CoreResult<()> {
        self.roles.grant(caller, who, role)
    }

    pub fn revoke_role(&mut self, caller: Address, who: Address, role: Role) -> CoreResult<()> {
        self.roles.revoke(caller, who, role)
    }

    pub fn has_role(&self, who: Address, role: Role) -> bool {
        self.roles.has(who, role)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: PositionId) -> CoreResult<&Position> {
        self.positions
            .get(&id)
            .ok_or(LedgerError::PositionNotFound { id })
    }

    pub fn exists(&self, id: PositionId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn live_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drain the event buffer.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Mint / burn (minter-gated)
    // ========================================================================

    /// Mint a new position for `owner`. The owner is recorded as the
    /// originating depositor.
    pub fn mint(&mut self, caller: Address, owner: Address, amount: U256) -> CoreResult<PositionId> {
        self.mint_for(caller, owner, amount, owner)
    }

    /// Mint with an explicitly supplied depositor identity. Used when a vault
    /// mints on behalf of its depositor.
    pub fn mint_for(
        &mut self,
        caller: Address,
        owner: Address,
        amount: U256,
        depositor: Address,
    ) -> CoreResult<PositionId> {
        self.roles.require_minter(caller)?;
        if amount == U256::ZERO {
            return Err(LedgerError::ZeroAmount);
        }

        let id = PositionId(self.next_id);
        self.next_id += 1;
        self.insert_position(Position {
            id,
            owner,
            pooled_amount: amount,
            originating_depositor: depositor,
        });
        Ok(id)
    }

    /// Insert a position under an externally assigned id, preserving it.
    ///
    /// Used when mirroring receipt rows from an upstream ledger. The id
    /// allocator is advanced past the imported id so locally minted ids can
    /// never collide with it.
    pub fn import_position(
        &mut self,
        caller: Address,
        id: PositionId,
        owner: Address,
        amount: U256,
        depositor: Address,
    ) -> CoreResult<()> {
        self.roles.require_minter(caller)?;
        if amount == U256::ZERO {
            return Err(LedgerError::ZeroAmount);
        }
        if self.positions.contains_key(&id) {
            return Err(LedgerError::DuplicatePosition { id });
        }

        self.next_id = self.next_id.max(id.0 + 1);
        self.insert_position(Position {
            id,
            owner,
            pooled_amount: amount,
            originating_depositor: depositor,
        });
        Ok(())
    }

    /// Remove a position entirely. Minter-gated; the burn is triggered by an
    /// owner-authorized withdrawal in the embedding vault.
    pub fn burn(&mut self, caller: Address, id: PositionId) -> CoreResult<()> {
        self.roles.require_minter(caller)?;
        if self.positions.remove(&id).is_none() {
            return Err(LedgerError::PositionNotFound { id });
        }
        tracing::debug!(target: "wharf::ledger", %id, "position burned");
        self.events.push(LedgerEvent::Burned { id });
        Ok(())
    }

    // ========================================================================
    // Owner operations
    // ========================================================================

    /// Approve `delegate` to act on every position owned by `owner`.
    pub fn approve(&mut self, owner: Address, delegate: Address) {
        self.approvals.insert(owner, delegate);
    }

    /// Clear the owner's approved delegate.
    pub fn revoke_approval(&mut self, owner: Address) {
        self.approvals.remove(&owner);
    }

    /// Transfer custody of `id` to `to`. Owner change only.
    pub fn transfer(&mut self, caller: Address, id: PositionId, to: Address) -> CoreResult<()> {
        let owner = self.get(id)?.owner;
        self.require_owner_or_approved(caller, owner, id)?;

        let position = self
            .positions
            .get_mut(&id)
            .ok_or(LedgerError::PositionNotFound { id })?;
        position.owner = to;
        tracing::debug!(target: "wharf::ledger", %id, from = %owner, %to, "position transferred");
        self.events.push(LedgerEvent::Transferred {
            id,
            from: owner,
            to,
        });
        Ok(())
    }

    /// Split `fraction` (WAD base, domain `[0, WAD)`) of `id` into a new
    /// position. The floored share moves to the new position; the remainder
    /// stays with the source, so rounding always favors the source. The new
    /// position belongs to the caller and keeps the source's originating
    /// depositor.
    pub fn split(
        &mut self,
        caller: Address,
        id: PositionId,
        fraction: U256,
    ) -> CoreResult<PositionId> {
        if fraction >= WAD {
            return Err(LedgerError::SplitOutOfRange { fraction });
        }

        let source = self.get(id)?.clone();
        self.require_owner_or_approved(caller, source.owner, id)?;

        let new_amount = mul_div_floor(source.pooled_amount, fraction, WAD)
            .ok_or(LedgerError::MathOverflow { operation: "split" })?;
        if new_amount == U256::ZERO {
            return Err(LedgerError::ZeroSplitAmount { id, fraction });
        }
        // fraction < WAD guarantees new_amount < pooled_amount, so the source
        // stays live.
        let remaining = source
            .pooled_amount
            .checked_sub(new_amount)
            .ok_or(LedgerError::MathOverflow { operation: "split" })?;
        debug_assert!(remaining > U256::ZERO);

        self.positions
            .get_mut(&id)
            .ok_or(LedgerError::PositionNotFound { id })?
            .pooled_amount = remaining;
        let new_id = PositionId(self.next_id);
        self.next_id += 1;
        self.insert_position(Position {
            id: new_id,
            owner: caller,
            pooled_amount: new_amount,
            originating_depositor: source.originating_depositor,
        });

        tracing::debug!(
            target: "wharf::ledger",
            source = %id,
            new = %new_id,
            amount = %new_amount,
            "position split"
        );
        self.events.push(LedgerEvent::Split {
            source: id,
            new: new_id,
            amount_moved: new_amount,
        });
        Ok(new_id)
    }

    // ========================================================================
    // Transactional boundary
    // ========================================================================

    /// Run `f` against the ledger with all-or-nothing semantics: if `f`
    /// returns an error, every mutation it made (events included) is rolled
    /// back.
    pub fn transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require_owner_or_approved(
        &self,
        caller: Address,
        owner: Address,
        id: PositionId,
    ) -> CoreResult<()> {
        if caller == owner || self.approvals.get(&owner) == Some(&caller) {
            return Ok(());
        }
        Err(LedgerError::NotOwnerOrApproved { caller, id })
    }

    fn insert_position(&mut self, position: Position) {
        tracing::debug!(
            target: "wharf::ledger",
            id = %position.id,
            owner = %position.owner,
            amount = %position.pooled_amount,
            "position minted"
        );
        self.events.push(LedgerEvent::Minted {
            id: position.id,
            owner: position.owner,
            pooled_amount: position.pooled_amount,
            depositor: position.originating_depositor,
        });
        self.positions.insert(position.id, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address([n; 20])
    }

    fn ledger_with_minter() -> (PositionLedger, Address, Address) {
        let admin = addr(1);
        let minter = addr(2);
        let mut ledger = PositionLedger::new(admin);
        ledger.grant_role(admin, minter, Role::Minter).unwrap();
        (ledger, admin, minter)
    }

    #[test]
    fn test_mint_requires_minter() {
        let (mut ledger, admin, minter) = ledger_with_minter();
        // The admin does not implicitly hold the minter capability
        let err = ledger.mint(admin, addr(9), WAD).unwrap_err();
        assert_eq!(err, LedgerError::NotMinter { caller: admin });

        let id = ledger.mint(minter, addr(9), WAD).unwrap();
        assert_eq!(ledger.get(id).unwrap().owner, addr(9));
        assert_eq!(ledger.get(id).unwrap().originating_depositor, addr(9));
    }

    #[test]
    fn test_mint_rejects_zero_amount() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let err = ledger.mint(minter, addr(9), U256::ZERO).unwrap_err();
        assert_eq!(err, LedgerError::ZeroAmount);
    }

    #[test]
    fn test_mint_for_records_depositor() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let id = ledger.mint_for(minter, addr(9), WAD, addr(7)).unwrap();
        assert_eq!(ledger.get(id).unwrap().originating_depositor, addr(7));
    }

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let a = ledger.mint(minter, addr(9), WAD).unwrap();
        ledger.burn(minter, a).unwrap();
        let b = ledger.mint(minter, addr(9), WAD).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_mint_burn_round_trip() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let id = ledger.mint(minter, addr(9), WAD).unwrap();
        ledger.burn(minter, id).unwrap();
        assert!(!ledger.exists(id));
        assert_eq!(
            ledger.get(id).unwrap_err(),
            LedgerError::PositionNotFound { id }
        );
    }

    #[test]
    fn test_burn_requires_minter_even_for_owner() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint(minter, owner, WAD).unwrap();
        let err = ledger.burn(owner, id).unwrap_err();
        assert_eq!(err, LedgerError::NotMinter { caller: owner });
    }

    #[test]
    fn test_split_conserves_amount() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        // 353 * 10^18 split at 0.53
        let amount = U256::new(353) * WAD;
        let fraction = U256::new(530_000_000_000_000_000u128);
        let id = ledger.mint(minter, owner, amount).unwrap();

        let new_id = ledger.split(owner, id, fraction).unwrap();
        let moved = ledger.get(new_id).unwrap().pooled_amount;
        let kept = ledger.get(id).unwrap().pooled_amount;

        // floor(353 * 0.53) at 18 decimals
        assert_eq!(moved, U256::new(187_090_000_000_000_000_000u128));
        assert_eq!(kept, U256::new(165_910_000_000_000_000_000u128));
        assert_eq!(moved + kept, amount);
    }

    #[test]
    fn test_split_rejects_full_fraction() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint(minter, owner, WAD).unwrap();
        for fraction in [WAD, WAD + U256::ONE, WAD * U256::new(2)] {
            let err = ledger.split(owner, id, fraction).unwrap_err();
            assert_eq!(err, LedgerError::SplitOutOfRange { fraction });
        }
    }

    #[test]
    fn test_split_rejects_zero_share() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint(minter, owner, U256::new(10)).unwrap();
        // fraction small enough that floor(10 * f / WAD) == 0
        let fraction = U256::new(1);
        let err = ledger.split(owner, id, fraction).unwrap_err();
        assert_eq!(err, LedgerError::ZeroSplitAmount { id, fraction });
        // no partial state
        assert_eq!(ledger.get(id).unwrap().pooled_amount, U256::new(10));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_split_preserves_depositor_lineage() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint_for(minter, owner, U256::new(100) * WAD, addr(7)).unwrap();
        let half = WAD / U256::new(2);

        let first = ledger.split(owner, id, half).unwrap();
        let second = ledger.split(owner, first, half).unwrap();
        assert_eq!(ledger.get(first).unwrap().originating_depositor, addr(7));
        assert_eq!(ledger.get(second).unwrap().originating_depositor, addr(7));
    }

    #[test]
    fn test_split_requires_owner_or_delegate() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let delegate = addr(10);
        let stranger = addr(11);
        let id = ledger.mint(minter, owner, U256::new(100) * WAD).unwrap();
        let half = WAD / U256::new(2);

        let err = ledger.split(stranger, id, half).unwrap_err();
        assert_eq!(
            err,
            LedgerError::NotOwnerOrApproved {
                caller: stranger,
                id
            }
        );

        ledger.approve(owner, delegate);
        let new_id = ledger.split(delegate, id, half).unwrap();
        // the split share goes to whoever performed the split
        assert_eq!(ledger.get(new_id).unwrap().owner, delegate);
        // lineage still follows the source
        assert_eq!(
            ledger.get(new_id).unwrap().originating_depositor,
            ledger.get(id).unwrap().originating_depositor
        );

        ledger.revoke_approval(owner);
        assert!(ledger.split(delegate, id, half).is_err());
    }

    #[test]
    fn test_transfer_changes_owner_only() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint_for(minter, owner, WAD, addr(7)).unwrap();
        ledger.transfer(owner, id, addr(12)).unwrap();

        let position = ledger.get(id).unwrap();
        assert_eq!(position.owner, addr(12));
        assert_eq!(position.pooled_amount, WAD);
        assert_eq!(position.originating_depositor, addr(7));

        // previous owner lost all rights
        assert!(ledger.transfer(owner, id, addr(9)).is_err());
    }

    #[test]
    fn test_split_emits_event_with_both_ids() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint(minter, owner, U256::new(100) * WAD).unwrap();
        ledger.drain_events();

        let new_id = ledger.split(owner, id, WAD / U256::new(4)).unwrap();
        let events = ledger.drain_events();
        assert!(events.contains(&LedgerEvent::Split {
            source: id,
            new: new_id,
            amount_moved: U256::new(25) * WAD,
        }));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (mut ledger, _, minter) = ledger_with_minter();
        let owner = addr(9);
        let id = ledger.mint(minter, owner, U256::new(100) * WAD).unwrap();
        ledger.drain_events();

        let err = ledger
            .transaction(|txn| {
                txn.split(owner, id, WAD / U256::new(2))?;
                // second op fails: fraction out of range
                txn.split(owner, id, WAD)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::SplitOutOfRange { .. }));

        // the successful first split was rolled back, events included
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(id).unwrap().pooled_amount, U256::new(100) * WAD);
        assert!(ledger.drain_events().is_empty());
    }

    #[test]
    fn test_import_preserves_id_and_advances_allocator() {
        let (mut ledger, _, minter) = ledger_with_minter();
        ledger
            .import_position(minter, PositionId(40), addr(9), WAD, addr(7))
            .unwrap();
        let err = ledger
            .import_position(minter, PositionId(40), addr(9), WAD, addr(7))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicatePosition {
                id: PositionId(40)
            }
        );

        let next = ledger.mint(minter, addr(9), WAD).unwrap();
        assert_eq!(next, PositionId(41));
    }
}
