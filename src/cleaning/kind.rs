use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::EtlError;

/// The six record collections the engine knows how to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Users,
    CardDetails,
    StoreDetails,
    ProductDetails,
    Orders,
    Events,
}

impl DatasetKind {
    /// Every kind, in the order a full load runs them.
    pub const ALL: [DatasetKind; 6] = [
        Self::Users,
        Self::CardDetails,
        Self::StoreDetails,
        Self::ProductDetails,
        Self::Orders,
        Self::Events,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::CardDetails => "card_details",
            Self::StoreDetails => "store_details",
            Self::ProductDetails => "product_details",
            Self::Orders => "orders",
            Self::Events => "events",
        }
    }

    /// Logical name of the raw table upstream.
    pub fn source_name(self) -> &'static str {
        match self {
            Self::Users => "legacy_users",
            Self::CardDetails => "card_details",
            Self::StoreDetails => "store_details",
            Self::ProductDetails => "products",
            Self::Orders => "orders_table",
            Self::Events => "date_details",
        }
    }

    /// Star-schema table the cleaned data is loaded into.
    pub fn target_table(self) -> &'static str {
        match self {
            Self::Users => "dim_users",
            Self::CardDetails => "dim_card_details",
            Self::StoreDetails => "dim_store_details",
            Self::ProductDetails => "dim_products",
            Self::Orders => "orders_table",
            Self::Events => "dim_date_times",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| EtlError::UnknownKind {
                name: s.to_string(),
            })
    }
}
