//! Account ledger: balances and the atomic multi-recipient transfer.

use std::collections::BTreeMap;

use dtl_crypto::{fingerprint_public_key, secret_digest};
use dtl_store::{LedgerStore, StateExt};
use dtl_types::{Account, AccountView, Fingerprint, NewAccountRequest};

use crate::error::{ContractError, ContractResult};
use crate::keys::ACCOUNT_INDEX;

/// Account operations over a ledger store.
pub struct Accounts<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> Accounts<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Load an account, `Ok(None)` if absent.
    pub fn find(&self, name: &str) -> ContractResult<Option<Account>> {
        Ok(self.store.get_composite_json(ACCOUNT_INDEX, &[name])?)
    }

    /// Load an account or fail with [`ContractError::AccountNotFound`].
    pub fn get(&self, name: &str) -> ContractResult<Account> {
        self.find(name)?
            .ok_or_else(|| ContractError::AccountNotFound(name.to_string()))
    }

    /// Persist an account. Balances are never written negative.
    pub fn put(&self, account: &Account) -> ContractResult<()> {
        if account.token < 0 {
            return Err(ContractError::InvalidAmount {
                account: account.name.clone(),
                amount: account.token,
            });
        }
        Ok(self
            .store
            .put_composite_json(ACCOUNT_INDEX, &[&account.name], account)?)
    }

    /// Provision a new account.
    ///
    /// The password, if any, is stored as a salted digest. A supplied public
    /// key must decode, so the account can later be matched to its caller.
    pub fn create(&self, request: &NewAccountRequest) -> ContractResult<AccountView> {
        tracing::debug!(name = %request.name, "creating account");
        if request.name.trim().is_empty() {
            return Err(ContractError::Validation("account name is empty".into()));
        }
        if request.token < 0 {
            return Err(ContractError::InvalidAmount {
                account: request.name.clone(),
                amount: request.token,
            });
        }
        if !request.public_key.is_empty() {
            fingerprint_public_key(&request.public_key).map_err(|e| {
                ContractError::Validation(format!("public key of {}: {e}", request.name))
            })?;
        }
        if self.find(&request.name)?.is_some() {
            return Err(ContractError::AccountExists(request.name.clone()));
        }

        let mut account = Account::new(&request.name, request.token)
            .with_org(&request.org_name)
            .with_public_key(&request.public_key);
        account.account_type = request.account_type;
        if !request.password.is_empty() {
            account.password = secret_digest(&request.name, &request.password);
        }
        self.put(&account)?;

        tracing::info!(name = %account.name, token = account.token, "account created");
        Ok(account.view())
    }

    /// Freeze or unfreeze an account.
    pub fn set_frozen(&self, name: &str, frozen: bool) -> ContractResult<AccountView> {
        let mut account = self.get(name)?;
        account.frozen = frozen;
        self.put(&account)?;
        tracing::info!(name, frozen, "account freeze flag updated");
        Ok(account.view())
    }

    /// Check that `caller` is the holder of `account`'s public key.
    pub fn verify_caller(&self, account: &Account, caller: &Fingerprint) -> ContractResult<()> {
        let owned = fingerprint_public_key(&account.public_key)
            .map_err(|_| ContractError::CallerMismatch(account.name.clone()))?;
        if owned != *caller {
            tracing::warn!(
                account = %account.name,
                caller = %caller.short_id(),
                "caller fingerprint does not match account"
            );
            return Err(ContractError::CallerMismatch(account.name.clone()));
        }
        Ok(())
    }

    /// Debit `from` and credit every recipient, returning `from`'s new balance.
    ///
    /// All amounts and balances are validated and every account is loaded
    /// before the first write. Recipients are written in name order, then
    /// the payer. An amount owed by `from` to itself is net zero and is
    /// neither debited nor credited.
    pub fn transfer(&self, from: &str, to_amounts: &BTreeMap<String, i64>) -> ContractResult<i64> {
        tracing::debug!(from, recipients = to_amounts.len(), "transfer requested");

        for (to, amount) in to_amounts {
            if *amount < 0 {
                return Err(ContractError::InvalidAmount {
                    account: to.clone(),
                    amount: *amount,
                });
            }
        }

        let mut payer = self.get(from)?;
        if payer.frozen {
            return Err(ContractError::AccountFrozen(payer.name));
        }

        let mut total: i64 = 0;
        for (to, amount) in to_amounts.iter().filter(|(to, _)| to.as_str() != from) {
            total = total.checked_add(*amount).ok_or_else(|| {
                ContractError::AmountOverflow(format!("total owed by {from} at {to}"))
            })?;
        }
        if !payer.can_afford(total) {
            return Err(ContractError::InsufficientBalance {
                account: payer.name,
                balance: payer.token,
                required: total,
            });
        }

        let mut credited = Vec::with_capacity(to_amounts.len());
        for (to, amount) in to_amounts.iter().filter(|(to, _)| to.as_str() != from) {
            let mut recipient = self.get(to)?;
            if recipient.frozen {
                return Err(ContractError::AccountFrozen(recipient.name));
            }
            recipient.token = recipient.token.checked_add(*amount).ok_or_else(|| {
                ContractError::AmountOverflow(format!("balance of {to}"))
            })?;
            credited.push(recipient);
        }

        for recipient in &credited {
            self.put(recipient)?;
            tracing::debug!(to = %recipient.name, token = recipient.token, "credited");
        }
        payer.token -= total;
        self.put(&payer)?;

        tracing::info!(from, debited = total, balance = payer.token, "transfer done");
        Ok(payer.token)
    }
}
