//! Session wiring: deploy the token, the engine, the collateral mocks and
//! their feeds, and hand MAY's mint authority and ownership to the engine.
//!
//! [`Protocol`] is the explicit session-scoped context threaded through the
//! test suites and the fuzzer in place of ambient chain state.

use crate::engine::{MayEngine, Result};
use crate::oracle::PriceFeed;
use crate::token::{MayToken, MockToken};
use crate::Address;

pub const FEED_DECIMALS: u8 = 8;
/// ETH/USD starting answer: $2000 at 8 decimals.
pub const ETH_USD_PRICE: i128 = 2_000_00000000;
/// BTC/USD starting answer: $30000 at 8 decimals.
pub const BTC_USD_PRICE: i128 = 30_000_00000000;

/// One deployed protocol session: the MAY token, the engine, and the two
/// collateral instruments. Feeds live inside the engine and are reached
/// through [`MayEngine::price_feed_mut`].
#[derive(Debug, Clone)]
pub struct Protocol {
    pub may: MayToken,
    pub engine: MayEngine,
    pub weth: MockToken,
    pub wbtc: MockToken,
}

impl Protocol {
    /// Seed 0 selects the first registered instrument, anything else the
    /// second.
    pub fn collateral_from_seed(&self, seed: u8) -> &MockToken {
        if seed == 0 {
            &self.weth
        } else {
            &self.wbtc
        }
    }

    pub fn collateral_from_seed_mut(&mut self, seed: u8) -> &mut MockToken {
        if seed == 0 {
            &mut self.weth
        } else {
            &mut self.wbtc
        }
    }

    pub fn collateral_address(&self, seed: u8) -> Address {
        self.collateral_from_seed(seed).address()
    }
}

/// Deploy a full session: token, mocks, feeds, engine, and the minter /
/// ownership handover that puts the engine in charge of MAY issuance.
pub fn deploy() -> Result<Protocol> {
    let deployer = Address::from_low_u64_be(0xD0);
    let may_address = Address::from_low_u64_be(0x1001);
    let weth_address = Address::from_low_u64_be(0x1002);
    let wbtc_address = Address::from_low_u64_be(0x1003);
    let eth_usd_address = Address::from_low_u64_be(0x1004);
    let btc_usd_address = Address::from_low_u64_be(0x1005);
    let engine_address = Address::from_low_u64_be(0x1006);

    let mut may = MayToken::new(may_address, deployer);
    let weth = MockToken::new(weth_address, "WETH");
    let wbtc = MockToken::new(wbtc_address, "WBTC");
    let eth_usd = PriceFeed::new(eth_usd_address, FEED_DECIMALS, ETH_USD_PRICE);
    let btc_usd = PriceFeed::new(btc_usd_address, FEED_DECIMALS, BTC_USD_PRICE);

    let engine = MayEngine::new(
        engine_address,
        may_address,
        vec![weth_address, wbtc_address],
        vec![eth_usd, btc_usd],
    )?;

    may.set_minter(deployer, engine_address, true)?;
    may.transfer_ownership(deployer, engine_address)?;

    log::info!("deployed MAY token at {may_address:?}");
    log::info!(
        "deployed {} mock at {weth_address:?}, {} mock at {wbtc_address:?}",
        weth.symbol(),
        wbtc.symbol()
    );
    log::info!("deployed MAY engine at {engine_address:?}");

    Ok(Protocol {
        may,
        engine,
        weth,
        wbtc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_owns_may_after_deploy() {
        let protocol = deploy().unwrap();
        assert_eq!(protocol.may.owner(), protocol.engine.address());
        assert!(protocol.may.is_minter(protocol.engine.address()));
        assert_eq!(protocol.engine.may_token(), protocol.may.address());
    }

    #[test]
    fn test_collateral_seed_resolution() {
        let protocol = deploy().unwrap();
        assert_eq!(
            protocol.collateral_address(0),
            protocol.engine.get_collateral_tokens()[0]
        );
        assert_eq!(
            protocol.collateral_address(1),
            protocol.engine.get_collateral_tokens()[1]
        );
    }
}
