/*!
 * Value Ledger
 *
 * A fungible balance ledger exposing the standard token surface used by the
 * escrow market's token rail: balance queries, direct transfers, and
 * allowance-based pull transfers. Call-compatible with
 * `soroban_sdk::token::Client`.
 *
 * The admin set at initialization is the only address allowed to mint.
 */

#![no_std]

mod types;


use soroban_sdk::{contract, contractimpl, log, Address, Env, String};

pub use types::{AllowanceValue, Error};
use types::{AllowanceKey, DataKey, Metadata, APPROVE, MINT, TRANSFER};

const DAY_IN_LEDGERS: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
const BALANCE_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const BALANCE_LIFETIME_THRESHOLD: u32 = BALANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

#[contract]
pub struct ValueLedger;

#[contractimpl]
impl ValueLedger {
    /// Sets the minting admin and token metadata. Can only be called once.
    pub fn initialize(
        env: Env,
        admin: Address,
        decimals: u32,
        name: String,
        symbol: String,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(
            &DataKey::Metadata,
            &Metadata {
                decimals,
                name,
                symbol,
            },
        );
        Self::_extend_instance_ttl(&env);

        Ok(())
    }

    /// Creates `amount` new units in `to`'s balance. Admin only.
    pub fn mint(env: Env, to: Address, amount: i128) -> Result<(), Error> {
        Self::_check_nonnegative(amount)?;

        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        Self::_receive(&env, &to, amount)?;
        Self::_extend_instance_ttl(&env);

        env.events().publish((MINT, admin, to), amount);

        Ok(())
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        Self::_read_balance(&env, &id)
    }

    /// Remaining amount `spender` may pull from `from`; zero once expired.
    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        Self::_read_allowance(&env, &from, &spender).amount
    }

    /// Lets `spender` pull up to `amount` from `from` until `expiration_ledger`.
    /// Overwrites any previous allowance for the pair.
    ///
    /// # Errors
    /// - NegativeAmount: If `amount` is below zero
    /// - InvalidExpiration: If a non-zero allowance would already be expired
    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        from.require_auth();
        Self::_check_nonnegative(amount)?;

        let sequence = env.ledger().sequence();
        if amount > 0 && expiration_ledger < sequence {
            log!(&env, "Allowance expiration {} before ledger {}", expiration_ledger, sequence);
            return Err(Error::InvalidExpiration);
        }

        let key = DataKey::Allowance(AllowanceKey {
            from: from.clone(),
            spender: spender.clone(),
        });
        env.storage().temporary().set(
            &key,
            &AllowanceValue {
                amount,
                expiration_ledger,
            },
        );
        if amount > 0 {
            let live_for = expiration_ledger - sequence;
            env.storage().temporary().extend_ttl(&key, live_for, live_for);
        }

        env.events()
            .publish((APPROVE, from, spender), (amount, expiration_ledger));

        Ok(())
    }

    /// Moves `amount` from `from` to `to`. `from` must sign.
    ///
    /// # Errors
    /// - NegativeAmount: If `amount` is below zero
    /// - InsufficientBalance: If `from` holds less than `amount`
    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        Self::_check_nonnegative(amount)?;

        Self::_spend(&env, &from, amount)?;
        Self::_receive(&env, &to, amount)?;

        env.events().publish((TRANSFER, from, to), amount);

        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. `spender` must sign.
    ///
    /// # Errors
    /// - NegativeAmount: If `amount` is below zero
    /// - InsufficientAllowance: If the allowance is below `amount` or expired
    /// - InsufficientBalance: If `from` holds less than `amount`
    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        Self::_check_nonnegative(amount)?;

        let allowance = Self::_read_allowance(&env, &from, &spender);
        if allowance.amount < amount {
            log!(&env, "Allowance {} below requested {}", allowance.amount, amount);
            return Err(Error::InsufficientAllowance);
        }

        Self::_spend(&env, &from, amount)?;
        Self::_receive(&env, &to, amount)?;

        if amount > 0 {
            let key = DataKey::Allowance(AllowanceKey {
                from: from.clone(),
                spender,
            });
            env.storage().temporary().set(
                &key,
                &AllowanceValue {
                    amount: allowance.amount - amount,
                    expiration_ledger: allowance.expiration_ledger,
                },
            );
        }

        env.events().publish((TRANSFER, from, to), amount);

        Ok(())
    }

    pub fn decimals(env: Env) -> Result<u32, Error> {
        Ok(Self::_metadata(&env)?.decimals)
    }

    pub fn name(env: Env) -> Result<String, Error> {
        Ok(Self::_metadata(&env)?.name)
    }

    pub fn symbol(env: Env) -> Result<String, Error> {
        Ok(Self::_metadata(&env)?.symbol)
    }

    fn _metadata(env: &Env) -> Result<Metadata, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Metadata)
            .ok_or(Error::NotInitialized)
    }

    fn _check_nonnegative(amount: i128) -> Result<(), Error> {
        if amount < 0 {
            return Err(Error::NegativeAmount);
        }
        Ok(())
    }

    fn _read_balance(env: &Env, id: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id.clone()))
            .unwrap_or(0)
    }

    fn _write_balance(env: &Env, id: &Address, amount: i128) {
        let key = DataKey::Balance(id.clone());
        env.storage().persistent().set(&key, &amount);
        env.storage()
            .persistent()
            .extend_ttl(&key, BALANCE_LIFETIME_THRESHOLD, BALANCE_BUMP_AMOUNT);
    }

    fn _spend(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
        let balance = Self::_read_balance(env, from);
        if balance < amount {
            log!(env, "Balance {} below requested {}", balance, amount);
            return Err(Error::InsufficientBalance);
        }
        Self::_write_balance(env, from, balance - amount);
        Ok(())
    }

    fn _receive(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
        let balance = Self::_read_balance(env, to)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::_write_balance(env, to, balance);
        Ok(())
    }

    fn _read_allowance(env: &Env, from: &Address, spender: &Address) -> AllowanceValue {
        let key = DataKey::Allowance(AllowanceKey {
            from: from.clone(),
            spender: spender.clone(),
        });
        match env.storage().temporary().get::<_, AllowanceValue>(&key) {
            Some(allowance) if allowance.expiration_ledger >= env.ledger().sequence() => allowance,
            Some(allowance) => AllowanceValue {
                amount: 0,
                expiration_ledger: allowance.expiration_ledger,
            },
            None => AllowanceValue {
                amount: 0,
                expiration_ledger: 0,
            },
        }
    }

    fn _extend_instance_ttl(env: &Env) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    }
}
