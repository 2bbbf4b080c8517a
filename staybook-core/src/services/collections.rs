//! Collection listing - the target collections a caller can pick from

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::StoreGateway;
use crate::services::listing::{extract_commission_rate, normalize_listing};

/// A non-canonical collection, typically one per property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub listing_name: String,
    /// Rate encoded in the collection title (`25% ...` -> `0.25`), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Decimal>,
}

pub struct CollectionsService {
    store: Arc<dyn StoreGateway>,
}

impl CollectionsService {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    /// Every collection except the canonical one, in store order
    pub fn list(&self) -> Result<Vec<CollectionInfo>> {
        Ok(self
            .store
            .list_collections()?
            .into_iter()
            .map(|name| CollectionInfo {
                listing_name: normalize_listing(&name),
                commission_rate: extract_commission_rate(&name),
                name,
            })
            .collect())
    }
}
