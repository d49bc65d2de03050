use serde::{Deserialize, Serialize};

/// A token balance holder, as stored in the ledger under the `account` index.
///
/// `password` holds a digest of the account's authentication material, never
/// the raw secret. `frozen` is part of the stored record but is left out of
/// [`AccountView`], the shape returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub password: String,
    /// Account category (enterprise, government, ...), opaque to the contract.
    #[serde(rename = "type", default)]
    pub account_type: i32,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub frozen: bool,
    pub token: i64,
}

impl Account {
    /// Create an unfrozen account with the given opening balance.
    pub fn new(name: impl Into<String>, token: i64) -> Self {
        Self {
            name: name.into(),
            password: String::new(),
            account_type: 0,
            org_name: String::new(),
            public_key: String::new(),
            frozen: false,
            token,
        }
    }

    /// Builder-style setter for the organization name.
    pub fn with_org(mut self, org_name: impl Into<String>) -> Self {
        self.org_name = org_name.into();
        self
    }

    /// Builder-style setter for the public key.
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = public_key.into();
        self
    }

    /// Returns `true` if the balance covers `amount`.
    pub fn can_afford(&self, amount: i64) -> bool {
        self.token >= amount
    }

    /// The public view of this account.
    pub fn view(&self) -> AccountView {
        AccountView {
            name: self.name.clone(),
            account_type: self.account_type,
            org_name: self.org_name.clone(),
            public_key: self.public_key.clone(),
            token: self.token,
        }
    }

    /// Name and balance, the shape returned by a purchase.
    pub fn token_response(&self) -> AccountTokenResponse {
        AccountTokenResponse {
            name: self.name.clone(),
            token: self.token,
        }
    }
}

/// Caller-facing account shape. Omits the frozen flag and credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: i32,
    pub org_name: String,
    pub public_key: String,
    pub token: i64,
}

/// Balance summary returned after a token transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTokenResponse {
    pub name: String,
    pub token: i64,
}

/// Provisioning request for a new account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountRequest {
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "type", default)]
    pub account_type: i32,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub token: i64,
}
