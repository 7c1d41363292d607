//! Storage access for the escrow market.
//!
//! Configuration sits in instance storage and shares the contract's
//! lifetime. Each order is its own persistent entry so the registry grows
//! without rewriting a single large map on every transition.

use soroban_sdk::Env;

use crate::types::{Config, DataKey, Error, Order};

/// Ledgers per day at ~5 seconds per ledger
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

const ORDER_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const ORDER_LIFETIME_THRESHOLD: u32 = ORDER_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

/// Reads the protocol configuration, failing if the market was never initialized.
pub fn read_config(env: &Env) -> Result<Config, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn write_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_order(env: &Env, id: u64) -> bool {
    env.storage().persistent().has(&DataKey::Order(id))
}

pub fn read_order(env: &Env, id: u64) -> Option<Order> {
    env.storage().persistent().get(&DataKey::Order(id))
}

pub fn write_order(env: &Env, order: &Order) {
    let key = DataKey::Order(order.id);
    env.storage().persistent().set(&key, order);
    env.storage()
        .persistent()
        .extend_ttl(&key, ORDER_LIFETIME_THRESHOLD, ORDER_BUMP_AMOUNT);
}

pub fn remove_order(env: &Env, id: u64) {
    env.storage().persistent().remove(&DataKey::Order(id));
}
