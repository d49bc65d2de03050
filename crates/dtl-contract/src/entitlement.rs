//! Entitlement verifier: proof-of-purchase check for downloads.

use dtl_store::{LedgerStore, StateExt};
use dtl_types::{DownloadTitle, TransferCheckRequest, TransferCheckResponse, TransferReceipt};

use crate::error::{ContractError, ContractResult};
use crate::evidence::EvidenceStore;
use crate::keys::{describe, TRANSFER_INDEX};

pub struct EntitlementVerifier<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> EntitlementVerifier<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Confirm the buyer paid for every requested `(title, hash)`.
    ///
    /// Fails fast: the first item without evidence, without a receipt, or
    /// whose receipt names a different hash fails the whole check. Evidence
    /// is looked up first, so a hash never recorded for the title reports
    /// [`ContractError::DataNotFound`] rather than a hash mismatch.
    pub fn check(&self, request: &TransferCheckRequest) -> ContractResult<TransferCheckResponse> {
        tracing::debug!(
            buyer = %request.buyer,
            owner = %request.owner,
            items = request.data.len(),
            "entitlement check"
        );
        let evidence = EvidenceStore::new(self.store);
        let mut entitled = Vec::with_capacity(request.data.len());

        for item in &request.data {
            let core = request.data_core(item);
            let description = evidence.lookup(&core)?;

            let attributes = core.transfer_attributes(&request.buyer);
            let receipt: TransferReceipt = self
                .store
                .get_composite_json(TRANSFER_INDEX, &attributes)?
                .ok_or_else(|| {
                    ContractError::NoPurchaseRecord(describe(TRANSFER_INDEX, &attributes))
                })?;
            if receipt.hash != item.hash {
                tracing::warn!(
                    key = %describe(TRANSFER_INDEX, &attributes),
                    recorded = %receipt.hash,
                    requested = %item.hash,
                    "purchase record hash mismatch"
                );
                return Err(ContractError::HashMismatch {
                    title: item.title.clone(),
                    recorded: receipt.hash,
                    requested: item.hash.clone(),
                });
            }

            entitled.push(DownloadTitle {
                title: item.title.clone(),
                hash: item.hash.clone(),
                extend: description.extend,
            });
        }

        Ok(TransferCheckResponse {
            data_type: request.data_type,
            owner: request.owner.clone(),
            data: entitled,
        })
    }
}
