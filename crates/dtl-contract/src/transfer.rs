//! Transfer engine: prices a purchase, pays every seller, and issues one
//! receipt per purchased title.

use std::collections::BTreeMap;

use dtl_store::{LedgerStore, StateExt, TxContext};
use dtl_types::collections::unique;
use dtl_types::{
    AccountTokenResponse, DataCore, DataType, TransferReceipt, TransferRecordView, TransferRequest,
};

use crate::accounts::Accounts;
use crate::catalog::TitleCatalog;
use crate::config::{ContractConfig, ReceiptPolicy};
use crate::error::{ContractError, ContractResult};
use crate::evidence::EvidenceStore;
use crate::keys::{decode, describe, split_expecting, TITLE_INDEX, TRANSFER_INDEX};

/// A purchase item that passed validation, with what its receipt records.
#[derive(Debug)]
struct PricedItem {
    core: DataCore,
    price: i64,
    size: i64,
}

pub struct TransferEngine<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    ctx: &'a C,
    config: &'a ContractConfig,
}

impl<'a, S, C> TransferEngine<'a, S, C>
where
    S: LedgerStore + ?Sized,
    C: TxContext + ?Sized,
{
    pub fn new(store: &'a S, ctx: &'a C, config: &'a ContractConfig) -> Self {
        Self { store, ctx, config }
    }

    /// Pay for a set of data items and record receipts.
    ///
    /// Every item is validated and priced before any token moves. Each
    /// seller is owed `price.value * size` per item. A title may appear with
    /// only one hash per request, since the buyer holds one receipt per title. Receipts are written
    /// only after the transfer succeeds; how a failed receipt write is
    /// handled follows [`ContractConfig::receipt_policy`].
    pub fn purchase(&self, request: &TransferRequest) -> ContractResult<AccountTokenResponse> {
        tracing::debug!(
            tx = self.ctx.tx_id(),
            buyer = %request.buyer,
            items = request.data.len(),
            "purchase requested"
        );
        if request.buyer.is_empty() {
            return Err(ContractError::Validation("buyer is empty".into()));
        }

        let accounts = Accounts::new(self.store);
        let buyer = accounts
            .find(&request.buyer)?
            .ok_or_else(|| ContractError::InvalidBuyer(request.buyer.clone()))?;
        if self.config.verify_buyer_identity {
            if let Some(caller) = self.ctx.caller_fingerprint() {
                accounts.verify_caller(&buyer, &caller)?;
            }
        }

        let items = if self.config.dedup_purchase_items {
            unique(&request.data)
        } else {
            request.data.clone()
        };
        reject_conflicting_hashes(&items)?;

        let evidence = EvidenceStore::new(self.store);
        let catalog = TitleCatalog::new(self.store);
        let mut owed: BTreeMap<String, i64> = BTreeMap::new();
        let mut priced = Vec::with_capacity(items.len());
        for core in items {
            let description = evidence.lookup(&core)?;
            let listing = catalog
                .get(core.data_type, &core.owner, &core.title)?
                .ok_or_else(|| {
                    ContractError::TitleNotFound(describe(TITLE_INDEX, &core.title_attributes()))
                })?;

            let price = listing.price.value;
            let amount = price.checked_mul(description.size).ok_or_else(|| {
                ContractError::AmountOverflow(format!(
                    "{price} x {} for {}",
                    description.size,
                    describe(TITLE_INDEX, &core.title_attributes())
                ))
            })?;
            let due = owed.entry(core.owner.clone()).or_insert(0);
            *due = due.checked_add(amount).ok_or_else(|| {
                ContractError::AmountOverflow(format!("amount owed to {}", core.owner))
            })?;
            priced.push(PricedItem {
                core,
                price,
                size: description.size,
            });
        }
        if owed.is_empty() || priced.is_empty() {
            return Err(ContractError::EmptyTransfer);
        }

        let mut payer = buyer;
        payer.token = accounts.transfer(&payer.name, &owed)?;
        let issued = self.issue_receipts(&payer.name, &priced)?;

        tracing::info!(
            tx = self.ctx.tx_id(),
            buyer = %payer.name,
            sellers = owed.len(),
            receipts = issued,
            balance = payer.token,
            "purchase complete"
        );
        Ok(payer.token_response())
    }

    fn issue_receipts(&self, buyer: &str, items: &[PricedItem]) -> ContractResult<usize> {
        let time = self.ctx.timestamp().as_unix_seconds();
        let mut issued = 0;
        for item in items {
            let receipt = TransferReceipt {
                hash: item.core.hash.clone(),
                price: item.price,
                time,
                size: item.size,
            };
            let attributes = item.core.transfer_attributes(buyer);
            match self
                .store
                .put_composite_json(TRANSFER_INDEX, &attributes, &receipt)
            {
                Ok(()) => issued += 1,
                Err(e) => match self.config.receipt_policy {
                    ReceiptPolicy::BestEffort => {
                        tracing::warn!(
                            key = %describe(TRANSFER_INDEX, &attributes),
                            error = %e,
                            "failed to save transfer record"
                        );
                    }
                    ReceiptPolicy::Strict => return Err(e.into()),
                },
            }
        }
        Ok(issued)
    }

    /// The receipt for one `(buyer, type, owner, title)`, `Ok(None)` if the
    /// buyer never purchased it.
    pub fn receipt(
        &self,
        buyer: &str,
        data_type: DataType,
        owner: &str,
        title: &str,
    ) -> ContractResult<Option<TransferReceipt>> {
        let type_attr = data_type.to_string();
        Ok(self
            .store
            .get_composite_json(TRANSFER_INDEX, &[buyer, type_attr.as_str(), owner, title])?)
    }

    /// Every receipt a buyer holds for one data type.
    pub fn list_records(
        &self,
        buyer: &str,
        data_type: DataType,
    ) -> ContractResult<Vec<TransferRecordView>> {
        let type_attr = data_type.to_string();
        let mut records = Vec::new();
        for entry in self
            .store
            .scan_partial_composite(TRANSFER_INDEX, &[buyer, type_attr.as_str()])?
        {
            let (key, value) = entry?;
            let mut attributes = split_expecting(&key, 4)?.into_iter();
            let record: TransferReceipt = decode(&key, &value)?;
            let (Some(buyer), Some(_), Some(owner), Some(title)) = (
                attributes.next(),
                attributes.next(),
                attributes.next(),
                attributes.next(),
            ) else {
                continue;
            };
            records.push(TransferRecordView {
                buyer,
                data_type,
                owner,
                title,
                record,
            });
        }
        Ok(records)
    }
}

/// Fail if one title is requested under two different hashes.
fn reject_conflicting_hashes(items: &[DataCore]) -> ContractResult<()> {
    let mut seen: BTreeMap<Vec<String>, &str> = BTreeMap::new();
    for core in items {
        let first = *seen
            .entry(core.title_attributes())
            .or_insert(core.hash.as_str());
        if first != core.hash {
            return Err(ContractError::ConflictingHashes {
                title: describe(TITLE_INDEX, &core.title_attributes()),
                first: first.to_string(),
                second: core.hash.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtl_store::{InMemoryLedger, StaticContext};
    use dtl_types::{Account, DataDescription, DataRequest, TitlePrice, TitleRequest, TxTimestamp};

    const NOW: i64 = 1_700_000_000;

    fn ctx() -> StaticContext {
        StaticContext::new("tx-1", TxTimestamp::from_unix_seconds(NOW))
    }

    fn market() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        let accounts = Accounts::new(&ledger);
        accounts.put(&Account::new("A", 0)).unwrap();
        accounts.put(&Account::new("C", 0)).unwrap();
        accounts.put(&Account::new("B", 1000)).unwrap();
        list(&ledger, "A", "T1", 50, "h1", 4);
        list(&ledger, "C", "T7", 10, "h7", 3);
        ledger
    }

    fn list(ledger: &InMemoryLedger, owner: &str, title: &str, value: i64, hash: &str, size: i64) {
        TitleCatalog::new(ledger)
            .set_title(&TitleRequest {
                data_type: 1,
                owner: owner.into(),
                title: title.into(),
                shelve: true,
                price: TitlePrice::new(1, 1000, value),
            })
            .unwrap();
        EvidenceStore::new(ledger)
            .record(&DataRequest {
                core: DataCore::new(1, owner, title, hash),
                description: DataDescription::new(size),
            })
            .unwrap();
    }

    fn buy(items: &[DataCore]) -> TransferRequest {
        TransferRequest {
            buyer: "B".into(),
            data: items.to_vec(),
        }
    }

    fn token(ledger: &InMemoryLedger, name: &str) -> i64 {
        Accounts::new(ledger).get(name).unwrap().token
    }

    #[test]
    fn purchase_pays_each_seller_and_issues_receipts() {
        let ledger = market();
        let config = ContractConfig::default();
        let ctx = ctx();
        let engine = TransferEngine::new(&ledger, &ctx, &config);

        let result = engine
            .purchase(&buy(&[
                DataCore::new(1, "A", "T1", "h1"),
                DataCore::new(1, "C", "T7", "h7"),
            ]))
            .unwrap();
        assert_eq!(result.name, "B");
        assert_eq!(result.token, 1000 - 200 - 30);
        assert_eq!(token(&ledger, "A"), 200);
        assert_eq!(token(&ledger, "C"), 30);

        let receipt = engine.receipt("B", 1, "A", "T1").unwrap().unwrap();
        assert_eq!(
            receipt,
            TransferReceipt {
                hash: "h1".into(),
                price: 50,
                time: NOW,
                size: 4
            }
        );
    }

    #[test]
    fn unknown_buyer_is_invalid() {
        let ledger = market();
        let config = ContractConfig::default();
        let ctx = ctx();
        let mut request = buy(&[DataCore::new(1, "A", "T1", "h1")]);
        request.buyer = "nobody".into();
        assert!(matches!(
            TransferEngine::new(&ledger, &ctx, &config).purchase(&request),
            Err(ContractError::InvalidBuyer(_))
        ));
    }

    #[test]
    fn missing_evidence_or_listing_aborts_before_payment() {
        let ledger = market();
        let config = ContractConfig::default();
        let ctx = ctx();
        let engine = TransferEngine::new(&ledger, &ctx, &config);

        assert!(matches!(
            engine.purchase(&buy(&[
                DataCore::new(1, "A", "T1", "h1"),
                DataCore::new(1, "A", "T1", "nope"),
            ])),
            Err(ContractError::DataNotFound(_))
        ));

        EvidenceStore::new(&ledger)
            .record(&DataRequest {
                core: DataCore::new(1, "A", "unlisted", "hx"),
                description: DataDescription::new(1),
            })
            .unwrap();
        assert!(matches!(
            engine.purchase(&buy(&[DataCore::new(1, "A", "unlisted", "hx")])),
            Err(ContractError::TitleNotFound(_))
        ));
        assert_eq!(token(&ledger, "B"), 1000);
    }

    #[test]
    fn empty_purchase_rejected() {
        let ledger = market();
        let config = ContractConfig::default();
        let ctx = ctx();
        assert!(matches!(
            TransferEngine::new(&ledger, &ctx, &config).purchase(&buy(&[])),
            Err(ContractError::EmptyTransfer)
        ));
    }

    #[test]
    fn duplicate_items_charged_once_when_deduplicating() {
        let item = DataCore::new(1, "A", "T1", "h1");
        let ctx = ctx();

        let ledger = market();
        let config = ContractConfig::default();
        let result = TransferEngine::new(&ledger, &ctx, &config)
            .purchase(&buy(&[item.clone(), item.clone()]))
            .unwrap();
        assert_eq!(result.token, 800);

        let ledger = market();
        let config = ContractConfig {
            dedup_purchase_items: false,
            ..Default::default()
        };
        let result = TransferEngine::new(&ledger, &ctx, &config)
            .purchase(&buy(&[item.clone(), item]))
            .unwrap();
        assert_eq!(result.token, 600);
    }

    #[test]
    fn price_times_size_overflow_detected() {
        let ledger = market();
        list(&ledger, "A", "Huge", 999, "hh", i64::MAX / 2);
        let config = ContractConfig::default();
        let ctx = ctx();
        assert!(matches!(
            TransferEngine::new(&ledger, &ctx, &config)
                .purchase(&buy(&[DataCore::new(1, "A", "Huge", "hh")])),
            Err(ContractError::AmountOverflow(_))
        ));
    }

    #[test]
    fn caller_must_hold_buyer_key_when_verifying() {
        let ledger = market();
        let mut buyer = Accounts::new(&ledger).get("B").unwrap();
        buyer.public_key = "0a0b0c".into();
        Accounts::new(&ledger).put(&buyer).unwrap();

        let config = ContractConfig {
            verify_buyer_identity: true,
            ..Default::default()
        };
        let stranger = ctx().with_fingerprint(dtl_crypto::fingerprint_public_key("ffff").unwrap());
        let owner = ctx().with_fingerprint(dtl_crypto::fingerprint_public_key("0a0b0c").unwrap());
        let item = [DataCore::new(1, "A", "T1", "h1")];

        assert!(matches!(
            TransferEngine::new(&ledger, &stranger, &config).purchase(&buy(&item)),
            Err(ContractError::CallerMismatch(_))
        ));
        TransferEngine::new(&ledger, &owner, &config)
            .purchase(&buy(&item))
            .unwrap();
    }

    #[test]
    fn list_records_by_buyer_and_type() {
        let ledger = market();
        let config = ContractConfig::default();
        let ctx = ctx();
        let engine = TransferEngine::new(&ledger, &ctx, &config);
        engine
            .purchase(&buy(&[
                DataCore::new(1, "C", "T7", "h7"),
                DataCore::new(1, "A", "T1", "h1"),
            ]))
            .unwrap();

        let records = engine.list_records("B", 1).unwrap();
        let titles: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.owner.as_str(), r.title.as_str()))
            .collect();
        assert_eq!(titles, vec![("A", "T1"), ("C", "T7")]);
        assert!(records.iter().all(|r| r.buyer == "B" && r.data_type == 1));
        assert!(engine.list_records("B", 2).unwrap().is_empty());
        assert!(engine.list_records("A", 1).unwrap().is_empty());
    }

    #[test]
    fn unshelved_listing_is_still_sold() {
        let ledger = market();
        TitleCatalog::new(&ledger)
            .set_title(&TitleRequest {
                data_type: 1,
                owner: "A".into(),
                title: "T1".into(),
                shelve: false,
                price: TitlePrice::new(1, 1000, 0),
            })
            .unwrap();
        let config = ContractConfig::default();
        let ctx = ctx();
        let engine = TransferEngine::new(&ledger, &ctx, &config);

        let result = engine
            .purchase(&buy(&[DataCore::new(1, "A", "T1", "h1")]))
            .unwrap();
        assert_eq!(result.token, 800);
        assert_eq!(token(&ledger, "A"), 200);
        assert!(engine.receipt("B", 1, "A", "T1").unwrap().is_some());
    }

    #[test]
    fn two_hashes_for_one_title_rejected_before_payment() {
        let ledger = market();
        EvidenceStore::new(&ledger)
            .record(&DataRequest {
                core: DataCore::new(1, "A", "T1", "h1b"),
                description: DataDescription::new(2),
            })
            .unwrap();
        let ctx = ctx();

        for dedup in [true, false] {
            let config = ContractConfig {
                dedup_purchase_items: dedup,
                ..Default::default()
            };
            let err = TransferEngine::new(&ledger, &ctx, &config)
                .purchase(&buy(&[
                    DataCore::new(1, "A", "T1", "h1"),
                    DataCore::new(1, "C", "T7", "h7"),
                    DataCore::new(1, "A", "T1", "h1b"),
                ]))
                .unwrap_err();
            assert!(matches!(
                err,
                ContractError::ConflictingHashes { ref first, ref second, .. }
                    if first == "h1" && second == "h1b"
            ));
        }
        assert_eq!(token(&ledger, "B"), 1000);
        assert_eq!(token(&ledger, "A"), 0);
        let config = ContractConfig::default();
        let engine = TransferEngine::new(&ledger, &ctx, &config);
        assert!(engine.receipt("B", 1, "A", "T1").unwrap().is_none());
    }

    #[test]
    fn same_title_from_different_owners_is_not_a_conflict() {
        let ledger = market();
        list(&ledger, "C", "T1", 5, "c1", 2);
        let config = ContractConfig::default();
        let ctx = ctx();
        let result = TransferEngine::new(&ledger, &ctx, &config)
            .purchase(&buy(&[
                DataCore::new(1, "A", "T1", "h1"),
                DataCore::new(1, "C", "T1", "c1"),
            ]))
            .unwrap();
        assert_eq!(result.token, 1000 - 200 - 10);
    }
}
