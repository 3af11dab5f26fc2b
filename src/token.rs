//! Token models: the MAY stablecoin and the mock collateral instruments.
//!
//! Both tokens share an ERC20-style [`Ledger`] (balances, allowances, total
//! supply). MAY adds owner/minter gating; the mocks add the test-only faucet
//! used by the fuzzing harness.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::Address;

/// Fixed grant handed out by [`MockToken::mock_mint`]: 10 ether-equivalent.
pub const MOCK_MINT_AMOUNT: u128 = 10_000_000_000_000_000_000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("erc20: mint to the zero address")]
    MintToZeroAddress,
    #[error("erc20: amount exceeds balance")]
    InsufficientBalance,
    #[error("erc20: insufficient allowance")]
    InsufficientAllowance,
    #[error("erc20: access is denied")]
    NotMinter,
    #[error("ownable: caller is not the owner")]
    NotOwner,
    #[error("erc20: arithmetic overflow")]
    Overflow,
}

pub type Result<T> = core::result::Result<T, TokenError>;

/// Shared ERC20 bookkeeping.
#[derive(Debug, Default, Clone)]
struct Ledger {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    total_supply: u128,
}

impl Ledger {
    fn balance_of(&self, account: Address) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        let from_balance = self.balance_of(from);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance)?;
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(from, remaining);
        self.balances.insert(to, to_balance);
        Ok(())
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: u128) -> Result<()> {
        let remaining = self
            .allowance(owner, spender)
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance)?;
        self.allowances.insert((owner, spender), remaining);
        Ok(())
    }

    fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(to, balance);
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: u128) -> Result<()> {
        let remaining = self
            .balance_of(from)
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance)?;
        self.balances.insert(from, remaining);
        self.total_supply -= amount;
        Ok(())
    }
}

/// The MAY stablecoin: mint and burn are restricted to the owner and
/// registered minters. Ownership is handed to the engine at deploy time.
#[derive(Debug, Clone)]
pub struct MayToken {
    address: Address,
    owner: Address,
    minters: HashSet<Address>,
    ledger: Ledger,
}

impl MayToken {
    pub fn new(address: Address, owner: Address) -> Self {
        MayToken {
            address,
            owner,
            minters: HashSet::new(),
            ledger: Ledger::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_minter(&self, account: Address) -> bool {
        self.minters.contains(&account)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply
    }

    pub fn balance_of(&self, account: Address) -> u128 {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.ledger.allowance(owner, spender)
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: u128) {
        self.ledger.approve(caller, spender, amount);
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: u128) -> Result<()> {
        self.ledger.transfer(caller, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        self.ledger.spend_allowance(from, caller, amount)?;
        self.ledger.transfer(from, to, amount)
    }

    pub fn mint(&mut self, caller: Address, to: Address, amount: u128) -> Result<()> {
        if to == Address::zero() {
            return Err(TokenError::MintToZeroAddress);
        }
        self.require_owner_or_minter(caller)?;
        self.ledger.mint(to, amount)
    }

    pub fn burn_from(&mut self, caller: Address, from: Address, amount: u128) -> Result<()> {
        self.require_owner_or_minter(caller)?;
        self.ledger.burn(from, amount)
    }

    pub fn set_minter(&mut self, caller: Address, account: Address, enabled: bool) -> Result<()> {
        self.require_owner(caller)?;
        if enabled {
            self.minters.insert(account);
        } else {
            self.minters.remove(&account);
        }
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.require_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }

    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(TokenError::NotOwner);
        }
        Ok(())
    }

    fn require_owner_or_minter(&self, caller: Address) -> Result<()> {
        if caller != self.owner && !self.is_minter(caller) {
            return Err(TokenError::NotMinter);
        }
        Ok(())
    }
}

/// WETH/WBTC-like collateral mock with an open faucet. Only exists under
/// emulation; the faucet models `mint_amount` on the mock contracts.
#[derive(Debug, Clone)]
pub struct MockToken {
    address: Address,
    symbol: &'static str,
    ledger: Ledger,
}

impl MockToken {
    pub fn new(address: Address, symbol: &'static str) -> Self {
        MockToken {
            address,
            symbol,
            ledger: Ledger::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply
    }

    pub fn balance_of(&self, account: Address) -> u128 {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.ledger.allowance(owner, spender)
    }

    /// Faucet: grant `amount` units to the caller, no gating.
    pub fn mint_amount(&mut self, caller: Address, amount: u128) -> Result<()> {
        self.ledger.mint(caller, amount)
    }

    /// Faucet with the standard 10-ether grant.
    pub fn mock_mint(&mut self, caller: Address) -> Result<()> {
        self.ledger.mint(caller, MOCK_MINT_AMOUNT)
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: u128) {
        self.ledger.approve(caller, spender, amount);
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: u128) -> Result<()> {
        self.ledger.transfer(caller, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        self.ledger.spend_allowance(from, caller, amount)?;
        self.ledger.transfer(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut weth = MockToken::new(addr(1), "WETH");
        weth.mint_amount(addr(2), 100).unwrap();
        weth.transfer(addr(2), addr(3), 60).unwrap();
        assert_eq!(weth.balance_of(addr(2)), 40);
        assert_eq!(weth.balance_of(addr(3)), 60);
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut weth = MockToken::new(addr(1), "WETH");
        weth.mint_amount(addr(2), 100).unwrap();
        weth.approve(addr(2), addr(9), 50);
        weth.transfer_from(addr(9), addr(2), addr(3), 50).unwrap();
        assert_eq!(weth.allowance(addr(2), addr(9)), 0);
        assert_eq!(
            weth.transfer_from(addr(9), addr(2), addr(3), 1),
            Err(TokenError::InsufficientAllowance)
        );
    }

    #[test]
    fn test_minter_gating() {
        let owner = addr(7);
        let mut may = MayToken::new(addr(1), owner);
        assert_eq!(
            may.mint(addr(8), addr(2), 10),
            Err(TokenError::NotMinter)
        );
        may.set_minter(owner, addr(8), true).unwrap();
        may.mint(addr(8), addr(2), 10).unwrap();
        assert_eq!(may.total_supply(), 10);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let owner = addr(7);
        let mut may = MayToken::new(addr(1), owner);
        may.mint(owner, addr(2), 10).unwrap();
        may.burn_from(owner, addr(2), 4).unwrap();
        assert_eq!(may.total_supply(), 6);
        assert_eq!(may.balance_of(addr(2)), 6);
    }
}
