use soroban_sdk::{contracterror, contracttype, symbol_short, Address, Symbol};

/// An allowance granted by `from` to `spender`.
///
/// The allowance reads as zero once the ledger sequence passes
/// `expiration_ledger`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceKey {
    pub from: Address,
    pub spender: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Metadata {
    pub decimals: u32,
    pub name: soroban_sdk::String,
    pub symbol: soroban_sdk::String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Metadata,
    Balance(Address),
    Allowance(AllowanceKey),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NegativeAmount = 3,
    InsufficientBalance = 4,
    InsufficientAllowance = 5,
    InvalidExpiration = 6,
    Overflow = 7,
}

pub const MINT: Symbol = symbol_short!("mint");
pub const TRANSFER: Symbol = symbol_short!("transfer");
pub const APPROVE: Symbol = symbol_short!("approve");
