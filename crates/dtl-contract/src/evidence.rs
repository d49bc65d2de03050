//! Data evidence store: proof-of-existence records keyed by
//! `(type, owner, title, hash)`.

use dtl_store::{LedgerStore, StateExt};
use dtl_types::{DataCore, DataDescription, DataRequest};

use crate::error::{ContractError, ContractResult};
use crate::keys::{describe, DATA_INDEX};

pub struct EvidenceStore<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> EvidenceStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Register evidence, overwriting any existing description for the key.
    pub fn record(&self, request: &DataRequest) -> ContractResult<()> {
        let core = &request.core;
        let fields = [
            ("owner", &core.owner),
            ("title", &core.title),
            ("hash", &core.hash),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(ContractError::Validation(format!("data {field} is empty")));
            }
        }
        if request.description.size < 0 {
            return Err(ContractError::Validation(format!(
                "data size {} is negative",
                request.description.size
            )));
        }

        let attributes = core.data_attributes();
        self.store
            .put_composite_json(DATA_INDEX, &attributes, &request.description)?;
        tracing::info!(
            key = %describe(DATA_INDEX, &attributes),
            size = request.description.size,
            "data evidence recorded"
        );
        Ok(())
    }

    /// Look up the description for one data item.
    pub fn lookup(&self, core: &DataCore) -> ContractResult<DataDescription> {
        let attributes = core.data_attributes();
        self.store
            .get_composite_json(DATA_INDEX, &attributes)?
            .ok_or_else(|| ContractError::DataNotFound(describe(DATA_INDEX, &attributes)))
    }

    /// Look up several items, failing on the first one never evidenced.
    pub fn show(&self, cores: &[DataCore]) -> ContractResult<Vec<DataRequest>> {
        cores
            .iter()
            .map(|core| {
                Ok(DataRequest {
                    core: core.clone(),
                    description: self.lookup(core)?,
                })
            })
            .collect()
    }
}
