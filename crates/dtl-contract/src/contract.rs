use dtl_store::{LedgerStore, TxContext};

use crate::accounts::Accounts;
use crate::catalog::TitleCatalog;
use crate::config::ContractConfig;
use crate::entitlement::EntitlementVerifier;
use crate::evidence::EvidenceStore;
use crate::transfer::TransferEngine;

/// The data marketplace contract bound to one ledger transaction.
///
/// `S` is the transaction's state view and `C` its invocation context. Every
/// operation reads current state, validates, and writes back through `S`;
/// nothing is kept between invocations.
pub struct DataTokenContract<S, C> {
    store: S,
    ctx: C,
    config: ContractConfig,
}

impl<S: LedgerStore, C: TxContext> DataTokenContract<S, C> {
    pub fn new(store: S, ctx: C) -> Self {
        Self::with_config(store, ctx, ContractConfig::default())
    }

    pub fn with_config(store: S, ctx: C, config: ContractConfig) -> Self {
        Self { store, ctx, config }
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn accounts(&self) -> Accounts<'_, S> {
        Accounts::new(&self.store)
    }

    pub fn evidence(&self) -> EvidenceStore<'_, S> {
        EvidenceStore::new(&self.store)
    }

    pub fn catalog(&self) -> TitleCatalog<'_, S> {
        TitleCatalog::new(&self.store)
    }

    pub fn transfers(&self) -> TransferEngine<'_, S, C> {
        TransferEngine::new(&self.store, &self.ctx, &self.config)
    }

    pub fn entitlements(&self) -> EntitlementVerifier<'_, S> {
        EntitlementVerifier::new(&self.store)
    }
}
