//! Title catalog: sellable listings keyed by `(type, owner, title)`.
//!
//! A listing is created by the first `set_title` for its key and updated in
//! place afterwards. Updates are computed on a copy of the stored listing
//! and written only once the whole price invariant holds again, so a
//! rejected update leaves the stored listing untouched. Listings are never
//! deleted; delisting is `shelve = false`.

use std::collections::BTreeMap;

use dtl_store::{LedgerStore, StateExt};
use dtl_types::collections::unique;
use dtl_types::{
    DataDescription, DataType, OwnerTitles, SearchTitleRequest, SearchTitleResult, TitleListing,
    TitleRequest,
};

use crate::error::{ContractError, ContractResult};
use crate::keys::{decode, describe, split_expecting, DATA_INDEX, TITLE_INDEX};

pub struct TitleCatalog<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> TitleCatalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The listing at `(type, owner, title)`, `Ok(None)` if never listed.
    pub fn get(
        &self,
        data_type: DataType,
        owner: &str,
        title: &str,
    ) -> ContractResult<Option<TitleListing>> {
        let type_attr = data_type.to_string();
        Ok(self
            .store
            .get_composite_json(TITLE_INDEX, &[type_attr.as_str(), owner, title])?)
    }

    /// Create or update a listing and return what was stored.
    pub fn set_title(&self, request: &TitleRequest) -> ContractResult<TitleListing> {
        if request.owner.is_empty() || request.title.is_empty() {
            return Err(ContractError::Validation("title owner and name are required".into()));
        }
        let attributes = request.title_attributes();
        tracing::debug!(key = %describe(TITLE_INDEX, &attributes), "set title");

        let existing: Option<TitleListing> =
            self.store.get_composite_json(TITLE_INDEX, &attributes)?;
        let listing = match existing {
            None => {
                request.price.valid().map_err(ContractError::InvalidPrice)?;
                request.listing()
            }
            Some(mut listing) => {
                listing.shelve = request.shelve;
                request.price.valid_range().map_err(ContractError::InvalidRange)?;
                listing.price.set_range(request.price.min, request.price.max);
                if request.price.value > 0 {
                    listing
                        .price
                        .valid_value(request.price.value)
                        .map_err(ContractError::InvalidValue)?;
                    listing.price.value = request.price.value;
                }
                listing.price.valid().map_err(ContractError::InvalidPrice)?;
                listing
            }
        };

        self.store
            .put_composite_json(TITLE_INDEX, &attributes, &listing)?;
        tracing::info!(
            key = %describe(TITLE_INDEX, &attributes),
            shelve = listing.shelve,
            min = listing.price.min,
            max = listing.price.max,
            value = listing.price.value,
            "title listed"
        );
        Ok(listing)
    }

    /// Every listing of one owner for a data type, in key order.
    pub fn list_by_owner(
        &self,
        data_type: DataType,
        owner: &str,
    ) -> ContractResult<Vec<TitleRequest>> {
        let type_attr = data_type.to_string();
        let mut listings = Vec::new();
        for entry in self
            .store
            .scan_partial_composite(TITLE_INDEX, &[type_attr.as_str(), owner])?
        {
            let (key, value) = entry?;
            let attributes = split_expecting(&key, 3)?;
            let listing: TitleListing = decode(&key, &value)?;
            listings.push(TitleRequest {
                data_type,
                owner: attributes[1].clone(),
                title: attributes[2].clone(),
                shelve: listing.shelve,
                price: listing.price,
            });
        }
        Ok(listings)
    }

    /// Names of shelved titles of one data type, grouped by owner.
    pub fn list_shelved_title_names_by_owner(
        &self,
        data_type: DataType,
    ) -> ContractResult<OwnerTitles> {
        let mut titles: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in self
            .store
            .scan_partial_composite(TITLE_INDEX, &[data_type.to_string()])?
        {
            let (key, value) = entry?;
            let listing: TitleListing = decode(&key, &value)?;
            if !listing.shelve {
                continue;
            }
            let mut attributes = split_expecting(&key, 3)?;
            let title = attributes.pop().unwrap_or_default();
            let owner = attributes.pop().unwrap_or_default();
            titles.entry(owner).or_default().push(title);
        }
        Ok(OwnerTitles { data_type, titles })
    }

    /// Evidenced data items under the requested shelved titles of one owner.
    ///
    /// Best effort: a title that is unlisted, unshelved, or fails to load is
    /// skipped rather than failing the whole search.
    pub fn search(&self, request: &SearchTitleRequest) -> ContractResult<Vec<SearchTitleResult>> {
        let mut results = Vec::new();
        for title in unique(&request.titles) {
            match self.search_title(request, &title) {
                Ok(found) => results.extend(found),
                Err(e) => {
                    tracing::warn!(
                        owner = %request.owner,
                        title = %title,
                        error = %e,
                        "search skipped title"
                    );
                }
            }
        }
        Ok(results)
    }

    fn search_title(
        &self,
        request: &SearchTitleRequest,
        title: &str,
    ) -> ContractResult<Vec<SearchTitleResult>> {
        let type_attr = request.data_type.to_string();
        let listing = self
            .get(request.data_type, &request.owner, title)?
            .ok_or_else(|| {
                ContractError::TitleNotFound(describe(
                    TITLE_INDEX,
                    &[type_attr.as_str(), request.owner.as_str(), title],
                ))
            })?;
        if !listing.shelve {
            tracing::debug!(owner = %request.owner, title, "title not shelved");
            return Ok(Vec::new());
        }

        let base = TitleRequest {
            data_type: request.data_type,
            owner: request.owner.clone(),
            title: title.to_string(),
            shelve: listing.shelve,
            price: listing.price,
        };
        let mut found = Vec::new();
        for entry in self.store.scan_partial_composite(
            DATA_INDEX,
            &[type_attr.as_str(), request.owner.as_str(), title],
        )? {
            let (key, value) = entry?;
            let mut attributes = split_expecting(&key, 4)?;
            let description: DataDescription = decode(&key, &value)?;
            found.push(SearchTitleResult {
                base: base.clone(),
                hash: attributes.pop().unwrap_or_default(),
                extend: description.extend,
            });
        }
        Ok(found)
    }
}
