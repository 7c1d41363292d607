/*!
 * Escrow Market Smart Contract
 *
 * A custodial marketplace where sellers list items at a fixed price, buyers
 * pay the price plus a protocol fee into the contract, and the protocol owner
 * acts as arbiter: funds stay locked until the owner completes the order.
 * Only then can the seller withdraw the price, with the fee routed to the owner.
 *
 * Key features:
 * - Orders settle either in the native asset or in any standard token
 * - Fee snapshot taken at purchase, later fee changes never touch it
 * - Owner-gated completion and fee administration
 * - Exactly-once withdrawal through a terminal `Withdrawn` state
 * - One event per successful transition for off-chain indexing
 *
 * Business Logic:
 * 1. Seller lists an order (no value moves)
 * 2. Buyer purchases it, `amount + fee` moves into custody
 * 3. Owner completes the order once fulfilment is confirmed
 * 4. Seller withdraws: `amount` to seller, `fee` to owner
 * 5. A listed order can be delisted by its seller or the owner
 */

#![no_std]

mod storage;
mod types;


use soroban_sdk::{contract, contractimpl, log, token, Address, Env};

pub use types::{Asset, Config, Error, Order, OrderState};
use types::{
    FEE_FACTOR_UPDATED, MARKET_INITIALIZED, ORDER_COMPLETED, ORDER_CREATED, ORDER_DELETED,
    ORDER_PURCHASED, ORDER_WITHDRAWN, OWNERSHIP_TRANSFERRED,
};

/// Standard basis points denominator for the fee factor
const BASIS_POINTS_DIVISOR: i128 = 10_000;

#[contract]
pub struct EscrowMarket;

#[contractimpl]
impl EscrowMarket {
    /// Sets up the market with its owner, fee factor and native asset.
    /// Can only be called once.
    ///
    /// # Arguments
    /// * `owner` - Arbiter address: completes orders, sets fees, collects fees
    /// * `fee_factor` - Fee in basis points charged on top of each order amount
    /// * `native_asset` - Token contract of the network's native asset
    ///
    /// # Errors
    /// - AlreadyInitialized: If the market already has a configuration
    pub fn initialize(
        env: Env,
        owner: Address,
        fee_factor: u32,
        native_asset: Address,
    ) -> Result<(), Error> {
        owner.require_auth();

        if storage::has_config(&env) {
            return Err(Error::AlreadyInitialized);
        }

        let config = Config {
            owner: owner.clone(),
            fee_factor,
            native_asset,
        };
        storage::write_config(&env, &config);

        env.events()
            .publish((MARKET_INITIALIZED,), (owner, fee_factor));

        Ok(())
    }

    /// Loads the configuration and checks that `caller` is the owner.
    fn _require_owner(env: &Env, caller: &Address) -> Result<Config, Error> {
        let config = storage::read_config(env)?;
        if *caller != config.owner {
            log!(env, "Unauthorized account: {}", caller.clone());
            return Err(Error::OwnableUnauthorizedAccount);
        }
        Ok(config)
    }

    /// Fee owed on `amount` at `fee_factor` basis points.
    ///
    /// Formula: (amount * fee_factor) / 10000, rounded down. Overflow is an
    /// error rather than being clamped.
    fn _calculate_fee(amount: i128, fee_factor: u32) -> Result<i128, Error> {
        amount
            .checked_mul(fee_factor as i128)
            .map(|scaled| scaled / BASIS_POINTS_DIVISOR)
            .ok_or(Error::ArithmeticOverflow)
    }

    /// Token contract that moves value for the given rail.
    fn _rail<'a>(env: &Env, config: &Config, asset: &Asset) -> token::Client<'a> {
        match asset {
            Asset::Native => token::Client::new(env, &config.native_asset),
            Asset::Token(token) => token::Client::new(env, token),
        }
    }

    /// Registers a new order. No value moves at listing time.
    ///
    /// # Arguments
    /// * `seller` - The address listing the order (must sign transaction)
    /// * `id` - Caller-chosen identifier, must not be taken by a stored order
    /// * `deadline` - Ledger timestamp strictly after the current one
    /// * `amount` - Price, strictly positive
    /// * `asset` - `None` for the native rail, `Some(token)` for a token rail
    ///
    /// # Errors
    /// - NotInitialized: If the market has no configuration
    /// - InvalidOrderData: Duplicate id, deadline not in the future, or amount <= 0
    pub fn list(
        env: Env,
        seller: Address,
        id: u64,
        deadline: u64,
        amount: i128,
        asset: Option<Address>,
    ) -> Result<(), Error> {
        seller.require_auth();
        storage::read_config(&env)?;

        if storage::has_order(&env, id) {
            log!(&env, "Order id already taken: {}", id);
            return Err(Error::InvalidOrderData);
        }

        let now = env.ledger().timestamp();
        if deadline <= now {
            log!(&env, "Deadline {} is not after ledger time {}", deadline, now);
            return Err(Error::InvalidOrderData);
        }

        if amount <= 0 {
            return Err(Error::InvalidOrderData);
        }

        let asset = match asset {
            Some(token) => Asset::Token(token),
            None => Asset::Native,
        };

        let order = Order {
            id,
            seller: seller.clone(),
            buyer: None,
            deadline,
            amount,
            asset: asset.clone(),
            fee: 0,
            state: OrderState::Listed,
        };
        storage::write_order(&env, &order);
        storage::extend_instance_ttl(&env);

        env.events()
            .publish((ORDER_CREATED,), (id, seller, deadline, amount, asset));

        Ok(())
    }

    /// Buys a listed order, moving `amount + fee` into the market's custody.
    ///
    /// The fee is computed from the fee factor in force now and stored on
    /// the order; later fee factor changes do not affect it.
    ///
    /// # Payment Rails
    /// - Native: `supplied_value` is the most the buyer is willing to pay.
    ///   It must cover `amount + fee`; exactly that total is transferred.
    /// - Token: the total is pulled with `transfer_from`, so the buyer must
    ///   have approved the market beforehand. `supplied_value` is ignored.
    ///
    /// # Arguments
    /// * `buyer` - The purchasing address (must sign transaction)
    /// * `id` - The order to buy
    /// * `supplied_value` - Native value offered with the purchase
    ///
    /// # Errors
    /// - InvalidOrderState: If the order does not exist or is not Listed
    /// - InvalidOrderBuyer: If the buyer is the seller
    /// - AddressInsufficientBalance: If supplied native value is below the total
    /// - ArithmeticOverflow: If the fee or total does not fit in an i128
    /// - Token transfer failures propagate from the token contract unchanged
    pub fn purchase(
        env: Env,
        buyer: Address,
        id: u64,
        supplied_value: Option<i128>,
    ) -> Result<(), Error> {
        buyer.require_auth();
        let config = storage::read_config(&env)?;

        let mut order = storage::read_order(&env, id).ok_or(Error::InvalidOrderState)?;
        if order.state != OrderState::Listed {
            return Err(Error::InvalidOrderState);
        }

        if buyer == order.seller {
            return Err(Error::InvalidOrderBuyer);
        }

        let fee = Self::_calculate_fee(order.amount, config.fee_factor)?;
        let total = order
            .amount
            .checked_add(fee)
            .ok_or(Error::ArithmeticOverflow)?;

        let market = env.current_contract_address();
        let rail = Self::_rail(&env, &config, &order.asset);
        match &order.asset {
            Asset::Native => {
                let supplied = supplied_value.unwrap_or(0);
                if supplied < total {
                    log!(
                        &env,
                        "Insufficient value from {}: required {}, supplied {}",
                        buyer.clone(),
                        total,
                        supplied
                    );
                    return Err(Error::AddressInsufficientBalance);
                }
                rail.transfer(&buyer, &market, &total);
            }
            Asset::Token(_) => {
                rail.transfer_from(&market, &buyer, &market, &total);
            }
        }

        order.buyer = Some(buyer.clone());
        order.fee = fee;
        order.state = OrderState::Purchased;
        storage::write_order(&env, &order);

        env.events().publish(
            (ORDER_PURCHASED,),
            (id, order.seller, buyer, order.amount, order.asset),
        );

        Ok(())
    }

    /// Removes a listed order and frees its id. No value moves.
    ///
    /// # Arguments
    /// * `caller` - The seller of the order or the owner (must sign transaction)
    /// * `id` - The order to remove
    ///
    /// # Errors
    /// - InvalidOrderState: If the order does not exist or has been purchased
    /// - InvalidOrderSeller: If the caller is neither the seller nor the owner
    pub fn delist(env: Env, caller: Address, id: u64) -> Result<(), Error> {
        caller.require_auth();
        let config = storage::read_config(&env)?;

        let order = storage::read_order(&env, id).ok_or(Error::InvalidOrderState)?;

        if caller != order.seller && caller != config.owner {
            return Err(Error::InvalidOrderSeller);
        }

        // Funds in custody belong to the buyer's claim
        if order.state != OrderState::Listed {
            return Err(Error::InvalidOrderState);
        }

        storage::remove_order(&env, id);

        env.events().publish((ORDER_DELETED,), (id,));

        Ok(())
    }

    /// Owner attestation that a purchased order was fulfilled.
    ///
    /// # Errors
    /// - OwnableUnauthorizedAccount: If the caller is not the owner
    /// - InvalidOrderState: If the order does not exist or is not Purchased
    pub fn complete(env: Env, caller: Address, id: u64) -> Result<(), Error> {
        caller.require_auth();
        Self::_require_owner(&env, &caller)?;

        let mut order = storage::read_order(&env, id).ok_or(Error::InvalidOrderState)?;
        if order.state != OrderState::Purchased {
            return Err(Error::InvalidOrderState);
        }

        order.state = OrderState::Completed;
        storage::write_order(&env, &order);

        env.events().publish((ORDER_COMPLETED,), (id,));

        Ok(())
    }

    /// Releases custody of a completed order: `amount` to the seller and the
    /// fee snapshot to the current owner, on the order's own rail.
    ///
    /// The order moves to `Withdrawn` before any transfer, so a second
    /// withdrawal fails on the state check.
    ///
    /// # Arguments
    /// * `seller` - The seller of the order (must sign transaction)
    /// * `id` - The order to settle
    ///
    /// # Errors
    /// - InvalidOrderState: If the order does not exist or is not Completed
    /// - InvalidOrderSeller: If the caller is not the order's seller
    pub fn withdraw(env: Env, seller: Address, id: u64) -> Result<(), Error> {
        seller.require_auth();
        let config = storage::read_config(&env)?;

        let mut order = storage::read_order(&env, id).ok_or(Error::InvalidOrderState)?;

        if seller != order.seller {
            return Err(Error::InvalidOrderSeller);
        }

        if order.state != OrderState::Completed {
            return Err(Error::InvalidOrderState);
        }

        order.state = OrderState::Withdrawn;
        storage::write_order(&env, &order);

        let market = env.current_contract_address();
        let rail = Self::_rail(&env, &config, &order.asset);
        rail.transfer(&market, &order.seller, &order.amount);
        if order.fee > 0 {
            rail.transfer(&market, &config.owner, &order.fee);
        }

        env.events().publish(
            (ORDER_WITHDRAWN,),
            (id, order.seller, order.amount, order.fee),
        );

        Ok(())
    }

    /// Updates the fee factor used by future purchases.
    /// Orders already purchased keep their fee snapshot.
    ///
    /// # Errors
    /// - OwnableUnauthorizedAccount: If the caller is not the owner
    pub fn set_fee_factor(env: Env, caller: Address, fee_factor: u32) -> Result<(), Error> {
        caller.require_auth();
        let mut config = Self::_require_owner(&env, &caller)?;

        let old_fee_factor = config.fee_factor;
        config.fee_factor = fee_factor;
        storage::write_config(&env, &config);

        env.events()
            .publish((FEE_FACTOR_UPDATED,), (old_fee_factor, fee_factor));

        Ok(())
    }

    /// Hands the owner role to `new_owner`, who must also sign.
    /// Fees of orders withdrawn afterwards go to the new owner.
    ///
    /// # Errors
    /// - OwnableUnauthorizedAccount: If the caller is not the owner
    pub fn transfer_ownership(env: Env, caller: Address, new_owner: Address) -> Result<(), Error> {
        caller.require_auth();
        let mut config = Self::_require_owner(&env, &caller)?;
        new_owner.require_auth();

        let old_owner = config.owner;
        config.owner = new_owner.clone();
        storage::write_config(&env, &config);

        env.events()
            .publish((OWNERSHIP_TRANSFERRED,), (old_owner, new_owner));

        Ok(())
    }

    // ================================================================================================
    // READ-ONLY QUERIES
    // ================================================================================================

    /// Returns the stored order, or `None` if it was never listed or was delisted.
    pub fn get_listing(env: Env, id: u64) -> Option<Order> {
        storage::read_order(&env, id)
    }

    /// Returns the fee factor in basis points applied to new purchases.
    pub fn fee_factor(env: Env) -> Result<u32, Error> {
        Ok(storage::read_config(&env)?.fee_factor)
    }

    /// Returns the current owner (arbiter and fee recipient).
    pub fn owner(env: Env) -> Result<Address, Error> {
        Ok(storage::read_config(&env)?.owner)
    }

    /// Returns the token contract used for native-rail orders.
    pub fn native_asset(env: Env) -> Result<Address, Error> {
        Ok(storage::read_config(&env)?.native_asset)
    }
}
