//! Typed helpers for the game events most hosts track.
//!
//! Each helper folds its single parameter into the payload as `name:value`.

use crate::runtime::handle::EventQueueHandle;

pub const LEVEL_START: &str = "levelStart";
pub const REWARD_CLAIM: &str = "rewardClaim";
pub const COINS_SPENDING: &str = "coinsSpending";

const LEVEL_START_PARAM: &str = "level";
const REWARD_CLAIM_PARAM: &str = "rewardBundle";
const COINS_SPENDING_PARAM: &str = "coinNumber";

impl EventQueueHandle {
    pub fn track_level_start(&self, level: u32) {
        self.track_param(LEVEL_START, LEVEL_START_PARAM, level);
    }

    pub fn track_reward_claim(&self, reward_bundle: &str) {
        self.track_param(REWARD_CLAIM, REWARD_CLAIM_PARAM, reward_bundle);
    }

    pub fn track_coins_spending(&self, coin_number: u64) {
        self.track_param(COINS_SPENDING, COINS_SPENDING_PARAM, coin_number);
    }

    fn track_param(&self, kind: &str, param: &str, value: impl std::fmt::Display) {
        self.track(kind, format!("{param}:{value}"));
    }
}
