//! Business logic of the Data Token Ledger marketplace contract.
//!
//! Sellers register proof-of-existence evidence for data items and list
//! titles for sale with a price range. Buyers pay for data items in tokens;
//! each purchase credits every seller, debits the buyer, and issues one
//! receipt per title. Receipts later gate downloads through an entitlement
//! check.
//!
//! All state lives in the ledger behind [`dtl_store::LedgerStore`], under
//! four composite indexes (see [`keys`]). Operations validate fully before
//! writing, and rely on the ledger transaction for atomicity and conflict
//! detection.
//!
//! # Components
//!
//! - [`Accounts`] -- balances and the multi-recipient transfer
//! - [`EvidenceStore`] -- data evidence records
//! - [`TitleCatalog`] -- listings, shelving, and search
//! - [`TransferEngine`] -- purchases and receipts
//! - [`EntitlementVerifier`] -- proof-of-purchase checks
//! - [`DataTokenContract`] -- all of the above bound to one transaction,
//!   with name-based dispatch through [`DataTokenContract::invoke`]

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod contract;
pub mod entitlement;
pub mod error;
pub mod evidence;
pub mod keys;
pub mod router;
pub mod transfer;

pub use accounts::Accounts;
pub use catalog::TitleCatalog;
pub use config::{ContractConfig, ReceiptPolicy};
pub use contract::DataTokenContract;
pub use entitlement::EntitlementVerifier;
pub use error::{ContractError, ContractResult, ErrorCategory};
pub use evidence::EvidenceStore;
pub use router::{Function, Response, STATUS_ERROR, STATUS_OK};
pub use transfer::TransferEngine;
