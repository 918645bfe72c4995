//! Per-kind rule tables.
//!
//! Each [`DatasetKind`] is described declaratively: the raw columns a source is expected to
//! deliver, and the ordered [`Step`]s that clean them. The engine interprets these generically.

use super::step::{Pattern, Step};
use super::DatasetKind;
use crate::types::{DataType, Schema};

pub const VALID_COUNTRIES: &[&str] = &["United Kingdom", "Germany", "United States"];
pub const VALID_COUNTRY_CODES: &[&str] = &["GB", "DE", "US"];
pub const VALID_CARD_PROVIDERS: &[&str] = &[
    "VISA 16 digit",
    "JCB 16 digit",
    "VISA 13 digit",
    "JCB 15 digit",
    "VISA 19 digit",
    "Diners Club / Carte Blanche",
    "American Express",
    "Maestro",
    "Discover",
    "Mastercard",
];
pub const VALID_REMOVED_FLAGS: &[&str] = &["Still_available", "Removed"];
pub const VALID_TIME_PERIODS: &[&str] = &["Evening", "Midday", "Morning", "Late_Hours"];

/// Longest card number a payment network issues.
pub const MAX_CARD_NUMBER_LEN: usize = 19;

/// Declarative description of one dataset kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindRules {
    pub kind: DatasetKind,
    /// Columns a source should deliver for this kind.
    pub columns: &'static [&'static str],
    /// Cleaning steps, applied in order.
    pub steps: Vec<Step>,
}

impl KindRules {
    /// Raw ingestion schema: every expected column as text.
    pub fn raw_schema(&self) -> Schema {
        Schema::utf8(self.columns.iter().copied())
    }
}

/// Rule table for `kind`.
pub fn rules_for(kind: DatasetKind) -> KindRules {
    let (columns, steps) = match kind {
        DatasetKind::Users => (USERS_COLUMNS, users_steps()),
        DatasetKind::CardDetails => (CARD_COLUMNS, card_details_steps()),
        DatasetKind::StoreDetails => (STORE_COLUMNS, store_details_steps()),
        DatasetKind::ProductDetails => (PRODUCT_COLUMNS, product_details_steps()),
        DatasetKind::Orders => (ORDER_COLUMNS, orders_steps()),
        DatasetKind::Events => (EVENT_COLUMNS, events_steps()),
    };
    KindRules {
        kind,
        columns,
        steps,
    }
}

const USERS_COLUMNS: &[&str] = &[
    "index",
    "first_name",
    "last_name",
    "date_of_birth",
    "company",
    "email_address",
    "address",
    "country",
    "country_code",
    "phone_number",
    "join_date",
    "user_uuid",
];

const CARD_COLUMNS: &[&str] = &[
    "card_number",
    "expiry_date",
    "card_provider",
    "date_payment_confirmed",
];

const STORE_COLUMNS: &[&str] = &[
    "index",
    "address",
    "longitude",
    "lat",
    "locality",
    "store_code",
    "staff_numbers",
    "opening_date",
    "store_type",
    "latitude",
    "country_code",
    "continent",
];

const PRODUCT_COLUMNS: &[&str] = &[
    "product_name",
    "product_price",
    "weight",
    "category",
    "EAN",
    "date_added",
    "uuid",
    "removed",
    "product_code",
];

const ORDER_COLUMNS: &[&str] = &[
    "index",
    "date_uuid",
    "user_uuid",
    "card_number",
    "store_code",
    "product_code",
    "product_quantity",
];

const EVENT_COLUMNS: &[&str] = &["timestamp", "month", "year", "day", "time_period", "date_uuid"];

fn coerce_all<'a>(columns: &'a [&'static str], to: DataType) -> impl Iterator<Item = Step> + 'a {
    columns.iter().map(move |&column| Step::Coerce {
        column,
        to: to.clone(),
    })
}

fn users_steps() -> Vec<Step> {
    let mut steps = vec![Step::SetIndex { column: "index" }];
    steps.extend(coerce_all(
        &[
            "first_name",
            "last_name",
            "company",
            "email_address",
            "address",
            "country",
            "country_code",
            "phone_number",
        ],
        DataType::Utf8,
    ));
    steps.extend(coerce_all(&["date_of_birth", "join_date"], DataType::Date));
    steps.extend([
        Step::RejectMatching {
            column: "first_name",
            pattern: Pattern::AllDigits,
        },
        Step::RejectMatching {
            column: "last_name",
            pattern: Pattern::AllDigits,
        },
        Step::Replace {
            column: "email_address",
            from: "@@",
            to: "@",
        },
        Step::KeepMatching {
            column: "email_address",
            pattern: Pattern::Email,
        },
        Step::TrimNewlines { column: "address" },
        Step::KeepIn {
            column: "country",
            allowed: VALID_COUNTRIES,
        },
        Step::Replace {
            column: "country_code",
            from: "GG",
            to: "G",
        },
        Step::KeepIn {
            column: "country_code",
            allowed: VALID_COUNTRY_CODES,
        },
        Step::NormalizeMissingLiteral,
        Step::DropRowsAllMissing,
    ]);
    steps
}

fn card_details_steps() -> Vec<Step> {
    let mut steps = vec![Step::NormalizeMissingLiteral, Step::DropRowsAllMissing];
    steps.extend(coerce_all(
        &["card_number", "card_provider", "expiry_date"],
        DataType::Utf8,
    ));
    steps.extend([
        Step::Coerce {
            column: "date_payment_confirmed",
            to: DataType::Date,
        },
        Step::StripChars {
            column: "card_number",
            chars: &['?'],
        },
        Step::CardNumber {
            column: "card_number",
        },
        Step::MaxLength {
            column: "card_number",
            max: MAX_CARD_NUMBER_LEN,
        },
        Step::KeepIn {
            column: "card_provider",
            allowed: VALID_CARD_PROVIDERS,
        },
        Step::KeepMatching {
            column: "expiry_date",
            pattern: Pattern::ExpiryDate,
        },
    ]);
    steps
}

fn store_details_steps() -> Vec<Step> {
    let mut steps = vec![
        Step::DropColumn { column: "lat" },
        Step::KeepDigits {
            column: "staff_numbers",
        },
    ];
    steps.extend(coerce_all(
        &[
            "address",
            "locality",
            "store_code",
            "store_type",
            "country_code",
            "continent",
        ],
        DataType::Utf8,
    ));
    steps.extend(coerce_all(&["longitude", "latitude"], DataType::Float64));
    steps.extend([
        Step::Coerce {
            column: "staff_numbers",
            to: DataType::Int64,
        },
        Step::KeepIn {
            column: "country_code",
            allowed: VALID_COUNTRY_CODES,
        },
        Step::Replace {
            column: "continent",
            from: "ee",
            to: "",
        },
        Step::TrimNewlines { column: "address" },
        Step::FillMissingWhere {
            column: "store_type",
            equals: "Web Portal",
            fill: "N/A",
        },
        Step::NormalizeMissingLiteral,
        Step::DropRowsAnyMissing,
    ]);
    steps
}

fn product_details_steps() -> Vec<Step> {
    let mut steps = vec![Step::NormalizeMissingLiteral, Step::DropRowsAnyMissing];
    steps.extend(coerce_all(
        &["product_name", "category", "uuid", "removed", "product_code", "EAN"],
        DataType::Utf8,
    ));
    steps.extend([
        Step::Coerce {
            column: "date_added",
            to: DataType::Date,
        },
        Step::KeepIn {
            column: "removed",
            allowed: VALID_REMOVED_FLAGS,
        },
        Step::ConvertWeight { column: "weight" },
        Step::StripChars {
            column: "product_price",
            chars: &['£', '$', ','],
        },
        Step::Coerce {
            column: "product_price",
            to: DataType::Float64,
        },
    ]);
    steps
}

fn orders_steps() -> Vec<Step> {
    vec![
        Step::SetIndex { column: "index" },
        Step::DropColumns {
            columns: &["first_name", "last_name", "1", "level_0"],
        },
    ]
}

fn events_steps() -> Vec<Step> {
    vec![Step::KeepIn {
        column: "time_period",
        allowed: VALID_TIME_PERIODS,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_required_column_is_an_expected_source_column() {
        for kind in DatasetKind::ALL {
            let rules = rules_for(kind);
            for step in &rules.steps {
                if let Some(column) = step.required_column() {
                    assert!(
                        rules.columns.contains(&column),
                        "{kind}: step {step} needs '{column}' which sources are not asked for"
                    );
                }
            }
        }
    }

    #[test]
    fn raw_schema_is_all_text() {
        let schema = rules_for(DatasetKind::Events).raw_schema();
        assert_eq!(schema.fields.len(), 6);
        assert!(schema.fields.iter().all(|f| f.data_type == DataType::Utf8));
    }

    #[test]
    fn card_provider_allow_list_has_ten_networks() {
        assert_eq!(VALID_CARD_PROVIDERS.len(), 10);
    }
}
