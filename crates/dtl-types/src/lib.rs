//! Foundation types for the Data Token Ledger (DTL).
//!
//! This crate provides the records and request/response payloads shared by
//! every other DTL crate. Records are what the contract stores in the ledger;
//! payloads are the JSON objects exchanged with the invocation router.
//!
//! # Key Types
//!
//! - [`Account`]: token balance holder, with its public [`AccountView`]
//! - [`DataCore`] / [`DataDescription`]: data evidence key and value
//! - [`TitlePrice`] / [`TitleListing`]: sellable catalog entry
//! - [`TransferReceipt`]: proof that a buyer paid for a title
//! - [`TxTimestamp`]: ledger transaction time
//! - [`Fingerprint`]: digest identifying a caller's public key
//!
//! The [`collections`] module carries the small set-algebra helpers used
//! when grouping and de-duplicating request items.

pub mod account;
pub mod collections;
pub mod data;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod title;
pub mod transfer;

pub use account::{Account, AccountTokenResponse, AccountView, NewAccountRequest};
pub use data::{parse_data_type, DataCore, DataDescription, DataRequest, DataType};
pub use error::TypeError;
pub use identity::Fingerprint;
pub use temporal::TxTimestamp;
pub use title::{
    OwnerTitles, PriceError, SearchTitleRequest, SearchTitleResult, TitleListing, TitlePrice,
    TitleRequest,
};
pub use transfer::{
    DownloadTitle, TransferCheckRequest, TransferCheckResponse, TransferReceipt,
    TransferRecordView, TransferRequest,
};
