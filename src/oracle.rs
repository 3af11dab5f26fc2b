//! Mock Chainlink-style price feed.
//!
//! The harness overwrites the answer directly through [`PriceFeed::update_answer`],
//! bypassing staleness checks entirely. This models adversarial or volatile
//! price movement independent of any real market feed.

use crate::Address;

#[derive(Debug, Clone)]
pub struct PriceFeed {
    address: Address,
    decimals: u8,
    answer: i128,
    round_id: u64,
    updated_at: u64,
}

impl PriceFeed {
    pub fn new(address: Address, decimals: u8, initial_answer: i128) -> Self {
        PriceFeed {
            address,
            decimals,
            answer: initial_answer,
            round_id: 1,
            updated_at: 1,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn latest_answer(&self) -> i128 {
        self.answer
    }

    /// Overwrite the current answer in place.
    pub fn update_answer(&mut self, new_answer: i128) {
        self.answer = new_answer;
        self.round_id += 1;
        self.updated_at += 1;
    }

    /// (round_id, answer, started_at, updated_at, answered_in_round)
    pub fn latest_round_data(&self) -> (u64, i128, u64, u64, u64) {
        (
            self.round_id,
            self.answer,
            self.updated_at,
            self.updated_at,
            self.round_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_answer_bumps_round() {
        let mut feed = PriceFeed::new(Address::from_low_u64_be(1), 8, 2_000_00000000);
        assert_eq!(feed.latest_answer(), 2_000_00000000);
        feed.update_answer(1_500_00000000);
        assert_eq!(feed.latest_answer(), 1_500_00000000);
        let (round_id, answer, _, _, _) = feed.latest_round_data();
        assert_eq!(round_id, 2);
        assert_eq!(answer, 1_500_00000000);
    }
}
