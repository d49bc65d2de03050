//! Name-based dispatch of contract invocations.
//!
//! An invocation is a function name plus positional string arguments, as a
//! ledger client submits them. Structured arguments are JSON documents.
//! Every call yields a [`Response`]: status 200 with a JSON payload, or
//! status 500 with a single human-readable message.

use std::fmt;
use std::str::FromStr;

use dtl_store::{LedgerStore, TxContext};
use dtl_types::{
    parse_data_type, DataCore, DataRequest, NewAccountRequest, SearchTitleRequest, TitleRequest,
    TransferCheckRequest, TransferRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::contract::DataTokenContract;
use crate::error::{ContractError, ContractResult, ErrorCategory};

pub const STATUS_OK: u16 = 200;
pub const STATUS_ERROR: u16 = 500;

/// Contract functions reachable through [`DataTokenContract::invoke`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    SetDataEvidence,
    ShowDataEvidence,
    SetTitle,
    ShowTitles,
    ShowNameOfTitles,
    SearchTitles,
    TransferData,
    ShowTransferRecord,
    CheckTransferred,
    CreateAccount,
    ShowAccount,
    FreezeAccount,
}

impl Function {
    pub const ALL: [Function; 12] = [
        Self::SetDataEvidence,
        Self::ShowDataEvidence,
        Self::SetTitle,
        Self::ShowTitles,
        Self::ShowNameOfTitles,
        Self::SearchTitles,
        Self::TransferData,
        Self::ShowTransferRecord,
        Self::CheckTransferred,
        Self::CreateAccount,
        Self::ShowAccount,
        Self::FreezeAccount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SetDataEvidence => "setDataEvidence",
            Self::ShowDataEvidence => "showDataEvidence",
            Self::SetTitle => "setTitle",
            Self::ShowTitles => "showTitles",
            Self::ShowNameOfTitles => "showNameOfTitles",
            Self::SearchTitles => "searchTitles",
            Self::TransferData => "transferData",
            Self::ShowTransferRecord => "showTransferRecord",
            Self::CheckTransferred => "checkTransferred",
            Self::CreateAccount => "createAccount",
            Self::ShowAccount => "showAccount",
            Self::FreezeAccount => "freezeAccount",
        }
    }

    /// Number of positional arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::ShowTitles | Self::ShowTransferRecord | Self::FreezeAccount => 2,
            _ => 1,
        }
    }

    /// Whether a successful call writes state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::SetDataEvidence
                | Self::SetTitle
                | Self::TransferData
                | Self::CreateAccount
                | Self::FreezeAccount
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ContractError::UnknownFunction(s.to_string()))
    }
}

/// Outcome of one invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// JSON payload; empty for operations with nothing to return.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Decode the payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }
}

fn parse_json<T: DeserializeOwned>(function: Function, arg: &str) -> ContractResult<T> {
    serde_json::from_str(arg).map_err(|e| {
        ContractError::Validation(format!("[{function}] failed to parse request: {e}"))
    })
}

fn to_payload<T: Serialize>(value: &T) -> ContractResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| ContractError::from(dtl_store::StoreError::Serialization(e.to_string())))
}

fn parse_flag(function: Function, arg: &str) -> ContractResult<bool> {
    arg.parse().map_err(|_| {
        ContractError::Validation(format!("[{function}] expected true or false, got {arg:?}"))
    })
}

impl<S: LedgerStore, C: TxContext> DataTokenContract<S, C> {
    /// Route an invocation by function name and wrap the outcome.
    pub fn invoke(&self, function: &str, args: &[String]) -> Response {
        match self.dispatch(function, args) {
            Ok(payload) => Response::success(payload),
            Err(e) => {
                let category: ErrorCategory = e.category();
                tracing::warn!(
                    tx = self.context().tx_id(),
                    function,
                    %category,
                    error = %e,
                    "invocation failed"
                );
                Response::error(e.to_string())
            }
        }
    }

    /// Route an invocation, keeping the typed error.
    pub fn dispatch(&self, function: &str, args: &[String]) -> ContractResult<Vec<u8>> {
        let function: Function = function.parse()?;
        if args.len() != function.arity() {
            return Err(ContractError::InvalidArguments {
                function: function.name().to_string(),
                expected: function.arity(),
                actual: args.len(),
            });
        }
        tracing::debug!(tx = self.context().tx_id(), %function, "invoke");

        match function {
            Function::SetDataEvidence => {
                let request: DataRequest = parse_json(function, &args[0])?;
                self.evidence().record(&request)?;
                Ok(Vec::new())
            }
            Function::ShowDataEvidence => {
                let cores: Vec<DataCore> = parse_json(function, &args[0])?;
                to_payload(&self.evidence().show(&cores)?)
            }
            Function::SetTitle => {
                let request: TitleRequest = parse_json(function, &args[0])?;
                self.catalog().set_title(&request)?;
                Ok(Vec::new())
            }
            Function::ShowTitles => {
                let data_type = parse_data_type(&args[0])
                    .map_err(|e| ContractError::Validation(format!("[{function}] {e}")))?;
                to_payload(&self.catalog().list_by_owner(data_type, &args[1])?)
            }
            Function::ShowNameOfTitles => {
                let data_type = parse_data_type(&args[0])
                    .map_err(|e| ContractError::Validation(format!("[{function}] {e}")))?;
                to_payload(&self.catalog().list_shelved_title_names_by_owner(data_type)?)
            }
            Function::SearchTitles => {
                let request: SearchTitleRequest = parse_json(function, &args[0])?;
                to_payload(&self.catalog().search(&request)?)
            }
            Function::TransferData => {
                let request: TransferRequest = parse_json(function, &args[0])?;
                to_payload(&self.transfers().purchase(&request)?)
            }
            Function::ShowTransferRecord => {
                let data_type = parse_data_type(&args[1])
                    .map_err(|e| ContractError::Validation(format!("[{function}] {e}")))?;
                to_payload(&self.transfers().list_records(&args[0], data_type)?)
            }
            Function::CheckTransferred => {
                let request: TransferCheckRequest = parse_json(function, &args[0])?;
                to_payload(&self.entitlements().check(&request)?)
            }
            Function::CreateAccount => {
                let request: NewAccountRequest = parse_json(function, &args[0])?;
                to_payload(&self.accounts().create(&request)?)
            }
            Function::ShowAccount => to_payload(&self.accounts().get(&args[0])?.view()),
            Function::FreezeAccount => {
                let frozen = parse_flag(function, &args[1])?;
                to_payload(&self.accounts().set_frozen(&args[0], frozen)?)
            }
        }
    }
}
