/*!
 * Type Definitions for the Escrow Market Smart Contract
 *
 * Data structures, enums, storage keys and event symbols shared by the
 * escrow market. Orders carry their own settlement rail so every
 * money-moving path can match on it instead of inspecting addresses.
 */

use soroban_sdk::{contracterror, contracttype, symbol_short, Address, Symbol};

// ================================================================================================
// CORE DATA STRUCTURES
// ================================================================================================

/// The rail an order settles on.
///
/// `Native` settles through the network's native asset contract configured at
/// initialization. `Token` settles through any contract exposing the standard
/// token interface, pulled from the buyer through a prior allowance.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Asset {
    Native,
    Token(Address),
}

/// A sale intent registered by a seller, plus its custody status.
///
/// # Lifecycle
/// 1. `list` creates the order in `Listed`, nothing is held in custody
/// 2. `purchase` locks `amount + fee` in the market and records the buyer
/// 3. `complete` is the owner's attestation that the item was delivered
/// 4. `withdraw` pays `amount` to the seller and `fee` to the owner
///
/// A `Listed` order can be removed with `delist`, which frees its id.
/// Orders past `Listed` are never removed, so their id stays taken.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Order {
    /// Caller-supplied identifier, unique among stored orders
    pub id: u64,

    /// The address that listed the order and receives `amount` on withdrawal
    pub seller: Address,

    /// Set once by `purchase`, never changed afterwards
    pub buyer: Option<Address>,

    /// Ledger timestamp (seconds) the listing is valid until.
    /// Checked once at listing; nothing expires automatically.
    pub deadline: u64,

    /// Price in the smallest unit of the settlement asset, always > 0
    pub amount: i128,

    /// Settlement rail, fixed at listing
    pub asset: Asset,

    /// Fee locked at purchase time from the fee factor in force then.
    /// Zero while the order is `Listed`.
    pub fee: i128,

    /// Current position in the order state machine
    pub state: OrderState,
}

/// Process-wide protocol configuration, stored as a single instance entry.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Arbiter: completes orders, sets the fee factor, collects fees
    pub owner: Address,

    /// Fee rate in basis points applied to an order's amount at purchase
    pub fee_factor: u32,

    /// Token contract of the network's native asset, used by `Asset::Native`
    pub native_asset: Address,
}

// ================================================================================================
// ENUMERATIONS
// ================================================================================================

/// Position of an order in its lifecycle.
///
/// # State Transition Rules
/// - Listed → Purchased (`purchase`, by anyone but the seller)
/// - Purchased → Completed (`complete`, owner only)
/// - Completed → Withdrawn (`withdraw`, seller only, exactly once)
/// - Listed → removed (`delist`, seller or owner)
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum OrderState {
    Listed = 1,
    Purchased = 2,
    Completed = 3,
    Withdrawn = 4,
}

/// Storage keys.
///
/// `Config` lives in instance storage next to the contract code, orders live
/// in persistent storage with one entry per id.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    Order(u64),
}

// ================================================================================================
// ERROR DEFINITIONS
// ================================================================================================

/// Errors returned by the escrow market.
///
/// Codes are stable and part of the contract interface. They start at 101 so
/// they never collide with the low codes used by token contracts. Failures
/// raised by a token contract during a transfer are not mapped here; they
/// abort the invocation with the token contract's own error code.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ========== Order Errors (101-105) ==========

    /// Duplicate id, deadline not after the current ledger time, or non-positive amount
    InvalidOrderData = 101,

    /// Order absent, or not in the state the operation requires
    InvalidOrderState = 102,

    /// The seller tried to buy their own order
    InvalidOrderBuyer = 103,

    /// Caller is not the seller (or, for delisting, the owner)
    InvalidOrderSeller = 104,

    /// Native value supplied with a purchase is below `amount + fee`
    AddressInsufficientBalance = 105,

    // ========== Access Control Errors (106) ==========

    /// Caller is not the protocol owner
    OwnableUnauthorizedAccount = 106,

    // ========== Lifecycle and Arithmetic Errors (107-109) ==========

    /// `initialize` was already called
    AlreadyInitialized = 107,

    /// An entry point was called before `initialize`
    NotInitialized = 108,

    /// Fee or total computation overflowed
    ArithmeticOverflow = 109,
}

// ================================================================================================
// EVENT CONSTANTS
// ================================================================================================

/// Contains: (owner, fee_factor)
/// Used by: initialize
pub const MARKET_INITIALIZED: Symbol = symbol_short!("init");

/// Contains: (id, seller, deadline, amount, asset)
/// Used by: list
pub const ORDER_CREATED: Symbol = symbol_short!("ord_crt");

/// Contains: (id, seller, buyer, amount, asset)
/// Used by: purchase
pub const ORDER_PURCHASED: Symbol = symbol_short!("ord_buy");

/// Contains: (id,)
/// Used by: delist
pub const ORDER_DELETED: Symbol = symbol_short!("ord_del");

/// Contains: (id,)
/// Used by: complete
pub const ORDER_COMPLETED: Symbol = symbol_short!("ord_cmp");

/// Contains: (id, seller, amount, fee)
/// Used by: withdraw
pub const ORDER_WITHDRAWN: Symbol = symbol_short!("ord_wdr");

/// Contains: (old_fee_factor, new_fee_factor)
/// Used by: set_fee_factor
pub const FEE_FACTOR_UPDATED: Symbol = symbol_short!("fee_upd");

/// Contains: (old_owner, new_owner)
/// Used by: transfer_ownership
pub const OWNERSHIP_TRANSFERRED: Symbol = symbol_short!("own_upd");
