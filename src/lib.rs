//! In-process model of the MAY over-collateralized stablecoin system.
//!
//! Two collaborating "contracts" make up the protocol:
//! 1. [`MayToken`] - the MAY stablecoin, an owner-gated mintable/burnable token
//! 2. [`MayEngine`] - the collateral vault, minter and liquidator backing MAY
//!
//! The engine accepts exactly two collateral instruments (WETH-like and
//! WBTC-like mock tokens), values them through mock Chainlink-style price
//! feeds, and enforces a 200% over-collateralization rule through a health
//! factor check on every debt-affecting operation.
//!
//! There is no real chain here: every contract is a plain struct, and every
//! state-mutating call takes an explicit `caller` address instead of relying
//! on ambient transaction context. [`deploy()`] wires a full session the way
//! the deployment scripts would, and `tests/fuzzing.rs` drives randomized
//! action sequences against it while asserting the core solvency guarantee:
//! the USD value of collateral held by the engine never falls below the
//! face value of MAY in circulation.

pub mod deploy;
pub mod engine;
pub mod oracle;
pub mod token;

/// 20-byte account identifier, matching EVM address semantics.
pub type Address = primitive_types::H160;

pub use deploy::{deploy, Protocol, BTC_USD_PRICE, ETH_USD_PRICE, FEED_DECIMALS};
pub use engine::{
    EngineError, MayEngine, ADDITIONAL_FEED_PRECISION, LIQUIDATION_BONUS, LIQUIDATION_PRECISION,
    LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION,
};
pub use oracle::PriceFeed;
pub use token::{MayToken, MockToken, TokenError, MOCK_MINT_AMOUNT};
