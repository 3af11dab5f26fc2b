//! The MAY engine: collateral vault, minter and liquidator.
//!
//! Users deposit one of two registered collateral instruments, mint MAY
//! against it, and stay subject to a health factor rule: the USD value of
//! their collateral, haircut to `LIQUIDATION_THRESHOLD` percent, must cover
//! their minted debt at all times. Anyone may liquidate a position whose
//! health factor falls below [`MIN_HEALTH_FACTOR`], receiving the covered
//! debt's worth of collateral plus a `LIQUIDATION_BONUS` percent reward.
//!
//! Every operation validates against the *projected* post-state before any
//! ledger is touched, so a rejected call leaves no partial mutation. This is
//! the in-process equivalent of transaction revert semantics.

use std::collections::HashMap;

use primitive_types::U256;
use thiserror::Error;

use crate::oracle::PriceFeed;
use crate::token::{MayToken, MockToken, TokenError};
use crate::Address;

/// 1e18, the wei-scale unit shared by token amounts and USD values.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;
/// Scales 8-decimal feed answers up to 18 decimals.
pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000;
/// Percent of collateral value that counts toward debt coverage.
pub const LIQUIDATION_THRESHOLD: u128 = 50;
pub const LIQUIDATION_PRECISION: u128 = 100;
/// Percent bonus collateral paid to liquidators.
pub const LIQUIDATION_BONUS: u128 = 10;
/// Health factors below this are liquidatable (1.0 at wei scale).
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("MAY_ENGINE: Token and price feed arrays must have the same length")]
    TokenFeedLengthMismatch,
    #[error("MAY_ENGINE: Amount must be greater than zero")]
    ZeroAmount,
    #[error("MAY_ENGINE: Debt amount must be greater than zero")]
    ZeroDebt,
    #[error("MAY_ENGINE: Collateral not supported")]
    UnsupportedCollateral,
    #[error("MAY_ENGINE: Health factor is below threshold")]
    HealthFactorBroken,
    #[error("MAY_ENGINE: Health factor is above threshold")]
    HealthFactorNotBroken,
    #[error("MAY_ENGINE: Health factor did not improve")]
    HealthFactorNotImproved,
    #[error("MAY_ENGINE: Insufficient collateral balance")]
    InsufficientCollateral,
    #[error("MAY_ENGINE: Burn amount exceeds minted MAY")]
    InsufficientDebt,
    #[error("MAY_ENGINE: Invalid price feed answer")]
    InvalidPrice,
    #[error("MAY_ENGINE: Arithmetic overflow")]
    Overflow,
    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type Result<T> = core::result::Result<T, EngineError>;

#[derive(Debug, Clone)]
pub struct MayEngine {
    address: Address,
    may_token: Address,
    collateral_tokens: Vec<Address>,
    price_feeds: HashMap<Address, PriceFeed>,
    /// (user, collateral token) -> deposited amount
    deposits: HashMap<(Address, Address), u128>,
    /// user -> minted MAY debt
    minted: HashMap<Address, u128>,
}

impl MayEngine {
    /// Register the collateral instruments and their feeds, paired 1:1.
    pub fn new(
        address: Address,
        may_token: Address,
        collateral_tokens: Vec<Address>,
        price_feeds: Vec<PriceFeed>,
    ) -> Result<Self> {
        if collateral_tokens.len() != price_feeds.len() {
            return Err(EngineError::TokenFeedLengthMismatch);
        }
        let price_feeds = collateral_tokens
            .iter()
            .copied()
            .zip(price_feeds)
            .collect();
        Ok(MayEngine {
            address,
            may_token,
            collateral_tokens,
            price_feeds,
            deposits: HashMap::new(),
            minted: HashMap::new(),
        })
    }

    // ------------------------------------------------------------------
    //                        STATE-CHANGING CALLS
    // ------------------------------------------------------------------

    /// Pull `amount` of `collateral` from the caller into the vault.
    pub fn deposit_collateral(
        &mut self,
        caller: Address,
        collateral: &mut MockToken,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let token = collateral.address();
        self.require_supported(token)?;
        let new_balance = self
            .collateral_balance(caller, token)
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        collateral.transfer_from(self.address, caller, self.address, amount)?;
        self.deposits.insert((caller, token), new_balance);
        Ok(())
    }

    /// Return `amount` of `collateral` to the caller, rejected when the
    /// caller's remaining position would fall below the health threshold.
    pub fn redeem_collateral(
        &mut self,
        caller: Address,
        collateral: &mut MockToken,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let token = collateral.address();
        self.require_supported(token)?;
        let remaining = self
            .collateral_balance(caller, token)
            .checked_sub(amount)
            .ok_or(EngineError::InsufficientCollateral)?;
        self.require_healthy_with(caller, self.minted_of(caller), token, remaining)?;
        self.deposits.insert((caller, token), remaining);
        collateral.transfer(self.address, caller, amount)?;
        Ok(())
    }

    /// Mint `amount` MAY to the caller against their deposited collateral.
    pub fn mint_may(&mut self, caller: Address, may: &mut MayToken, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let new_minted = self
            .minted_of(caller)
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        let collateral_value = self.account_collateral_value(caller, None)?;
        if Self::calculate_health_factor(new_minted, collateral_value)
            < U256::from(MIN_HEALTH_FACTOR)
        {
            return Err(EngineError::HealthFactorBroken);
        }
        self.minted.insert(caller, new_minted);
        may.mint(self.address, caller, amount)?;
        Ok(())
    }

    /// Burn `amount` of the caller's MAY, reducing their recorded debt.
    /// The caller must have approved the engine for the amount.
    pub fn burn_may(&mut self, caller: Address, may: &mut MayToken, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let remaining_debt = self
            .minted_of(caller)
            .checked_sub(amount)
            .ok_or(EngineError::InsufficientDebt)?;
        may.transfer_from(self.address, caller, self.address, amount)?;
        may.burn_from(self.address, self.address, amount)?;
        self.minted.insert(caller, remaining_debt);
        Ok(())
    }

    /// Deposit collateral and mint MAY in one call, all-or-nothing.
    pub fn deposit_collateral_and_mint_may(
        &mut self,
        caller: Address,
        collateral: &mut MockToken,
        may: &mut MayToken,
        collateral_amount: u128,
        may_amount: u128,
    ) -> Result<()> {
        if collateral_amount == 0 || may_amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let token = collateral.address();
        self.require_supported(token)?;
        let new_balance = self
            .collateral_balance(caller, token)
            .checked_add(collateral_amount)
            .ok_or(EngineError::Overflow)?;
        let new_minted = self
            .minted_of(caller)
            .checked_add(may_amount)
            .ok_or(EngineError::Overflow)?;
        self.require_healthy_with(caller, new_minted, token, new_balance)?;
        collateral.transfer_from(self.address, caller, self.address, collateral_amount)?;
        self.deposits.insert((caller, token), new_balance);
        self.minted.insert(caller, new_minted);
        may.mint(self.address, caller, may_amount)?;
        Ok(())
    }

    /// Burn MAY and withdraw collateral in one call, all-or-nothing.
    pub fn redeem_collateral_for_may(
        &mut self,
        caller: Address,
        collateral: &mut MockToken,
        may: &mut MayToken,
        collateral_amount: u128,
        may_amount: u128,
    ) -> Result<()> {
        if collateral_amount == 0 || may_amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let token = collateral.address();
        self.require_supported(token)?;
        let remaining_held = self
            .collateral_balance(caller, token)
            .checked_sub(collateral_amount)
            .ok_or(EngineError::InsufficientCollateral)?;
        let remaining_debt = self
            .minted_of(caller)
            .checked_sub(may_amount)
            .ok_or(EngineError::InsufficientDebt)?;
        self.require_healthy_with(caller, remaining_debt, token, remaining_held)?;
        may.transfer_from(self.address, caller, self.address, may_amount)?;
        may.burn_from(self.address, self.address, may_amount)?;
        self.minted.insert(caller, remaining_debt);
        self.deposits.insert((caller, token), remaining_held);
        collateral.transfer(self.address, caller, collateral_amount)?;
        Ok(())
    }

    /// Cover `debt_to_cover` of `user`'s MAY debt and seize the equivalent
    /// collateral plus the liquidation bonus. The target must be below the
    /// health threshold before, and strictly better off after.
    pub fn liquidate(
        &mut self,
        caller: Address,
        collateral: &mut MockToken,
        may: &mut MayToken,
        user: Address,
        debt_to_cover: u128,
    ) -> Result<()> {
        if debt_to_cover == 0 {
            return Err(EngineError::ZeroDebt);
        }
        let starting_health_factor = self.health_factor(user)?;
        if starting_health_factor >= U256::from(MIN_HEALTH_FACTOR) {
            return Err(EngineError::HealthFactorNotBroken);
        }

        let token = collateral.address();
        let token_amount = self.get_token_amount_from_usd(token, debt_to_cover)?;
        let bonus = token_amount
            .checked_mul(LIQUIDATION_BONUS)
            .ok_or(EngineError::Overflow)?
            / LIQUIDATION_PRECISION;
        let seized = token_amount
            .checked_add(bonus)
            .ok_or(EngineError::Overflow)?;

        let remaining_held = self
            .collateral_balance(user, token)
            .checked_sub(seized)
            .ok_or(EngineError::InsufficientCollateral)?;
        let remaining_debt = self
            .minted_of(user)
            .checked_sub(debt_to_cover)
            .ok_or(EngineError::InsufficientDebt)?;

        let value_after = self.account_collateral_value(user, Some((token, remaining_held)))?;
        let ending_health_factor = Self::calculate_health_factor(remaining_debt, value_after);
        if ending_health_factor <= starting_health_factor {
            return Err(EngineError::HealthFactorNotImproved);
        }
        if self.health_factor(caller)? < U256::from(MIN_HEALTH_FACTOR) {
            return Err(EngineError::HealthFactorBroken);
        }

        may.transfer_from(self.address, caller, self.address, debt_to_cover)?;
        may.burn_from(self.address, self.address, debt_to_cover)?;
        self.minted.insert(user, remaining_debt);
        self.deposits.insert((user, token), remaining_held);
        collateral.transfer(self.address, caller, seized)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    //                         VIEWS & PURE MATH
    // ------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn may_token(&self) -> Address {
        self.may_token
    }

    pub fn get_collateral_tokens(&self) -> &[Address] {
        &self.collateral_tokens
    }

    pub fn price_feed(&self, token: Address) -> Result<&PriceFeed> {
        self.price_feeds
            .get(&token)
            .ok_or(EngineError::UnsupportedCollateral)
    }

    /// Mutable feed access for harness-driven price shocks.
    pub fn price_feed_mut(&mut self, token: Address) -> Result<&mut PriceFeed> {
        self.price_feeds
            .get_mut(&token)
            .ok_or(EngineError::UnsupportedCollateral)
    }

    pub fn get_collateral_balance_of_user(&self, user: Address, token: Address) -> u128 {
        self.collateral_balance(user, token)
    }

    pub fn minted_of(&self, user: Address) -> u128 {
        self.minted.get(&user).copied().unwrap_or(0)
    }

    /// USD value (wei scale) of `amount` units of `token` at the current
    /// feed answer.
    pub fn get_usd_value(&self, token: Address, amount: u128) -> Result<u128> {
        let price = self.price_feed(token)?.latest_answer();
        if price < 0 {
            return Err(EngineError::InvalidPrice);
        }
        let value = U256::from(price as u128)
            * U256::from(ADDITIONAL_FEED_PRECISION)
            * U256::from(amount)
            / U256::from(PRECISION);
        to_u128(value)
    }

    /// Inverse of [`Self::get_usd_value`]: token units worth `usd_amount`.
    pub fn get_token_amount_from_usd(&self, token: Address, usd_amount: u128) -> Result<u128> {
        let price = self.price_feed(token)?.latest_answer();
        if price <= 0 {
            return Err(EngineError::InvalidPrice);
        }
        let scaled_price = U256::from(price as u128) * U256::from(ADDITIONAL_FEED_PRECISION);
        to_u128(U256::from(usd_amount) * U256::from(PRECISION) / scaled_price)
    }

    pub fn get_account_collateral_value(&self, user: Address) -> Result<u128> {
        self.account_collateral_value(user, None)
    }

    /// (minted debt, USD value of all deposited collateral)
    pub fn get_account_information(&self, user: Address) -> Result<(u128, u128)> {
        Ok((self.minted_of(user), self.account_collateral_value(user, None)?))
    }

    pub fn health_factor(&self, user: Address) -> Result<U256> {
        let (minted, collateral_value) = self.get_account_information(user)?;
        Ok(Self::calculate_health_factor(minted, collateral_value))
    }

    /// Health factor at wei scale: threshold-adjusted collateral value over
    /// debt. `U256::MAX` when there is no debt.
    pub fn calculate_health_factor(total_minted: u128, collateral_value_usd: u128) -> U256 {
        if total_minted == 0 {
            return U256::MAX;
        }
        let adjusted = U256::from(collateral_value_usd) * U256::from(LIQUIDATION_THRESHOLD)
            / U256::from(LIQUIDATION_PRECISION);
        adjusted * U256::from(PRECISION) / U256::from(total_minted)
    }

    // ------------------------------------------------------------------
    //                            INTERNALS
    // ------------------------------------------------------------------

    fn require_supported(&self, token: Address) -> Result<()> {
        if !self.price_feeds.contains_key(&token) {
            return Err(EngineError::UnsupportedCollateral);
        }
        Ok(())
    }

    fn collateral_balance(&self, user: Address, token: Address) -> u128 {
        self.deposits.get(&(user, token)).copied().unwrap_or(0)
    }

    /// Account collateral value, optionally substituting one token's balance
    /// to evaluate a projected post-state.
    fn account_collateral_value(
        &self,
        user: Address,
        substitute: Option<(Address, u128)>,
    ) -> Result<u128> {
        let mut total: u128 = 0;
        for &token in &self.collateral_tokens {
            let balance = match substitute {
                Some((t, b)) if t == token => b,
                _ => self.collateral_balance(user, token),
            };
            total = total
                .checked_add(self.get_usd_value(token, balance)?)
                .ok_or(EngineError::Overflow)?;
        }
        Ok(total)
    }

    fn require_healthy_with(
        &self,
        user: Address,
        minted: u128,
        token: Address,
        balance: u128,
    ) -> Result<()> {
        if minted == 0 {
            return Ok(());
        }
        let value = self.account_collateral_value(user, Some((token, balance)))?;
        if Self::calculate_health_factor(minted, value) < U256::from(MIN_HEALTH_FACTOR) {
            return Err(EngineError::HealthFactorBroken);
        }
        Ok(())
    }
}

fn to_u128(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(EngineError::Overflow);
    }
    Ok(value.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_factor_zero_debt_is_max() {
        assert_eq!(MayEngine::calculate_health_factor(0, 0), U256::MAX);
        assert_eq!(
            MayEngine::calculate_health_factor(0, 123 * PRECISION),
            U256::MAX
        );
    }

    #[test]
    fn test_health_factor_exact_values() {
        // 400 USD of collateral adjusted to 200, against 100 of debt -> 2.0
        let hf = MayEngine::calculate_health_factor(100 * PRECISION, 400 * PRECISION);
        assert_eq!(hf, U256::from(2 * PRECISION));
        // Exactly at the threshold: 200 collateral vs 100 debt -> 1.0
        let hf = MayEngine::calculate_health_factor(100 * PRECISION, 200 * PRECISION);
        assert_eq!(hf, U256::from(MIN_HEALTH_FACTOR));
    }
}
