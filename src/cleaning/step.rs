//! The step vocabulary cleaning pipelines are written in.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::DatasetKind;
use crate::error::{EtlError, EtlResult};
use crate::processing::{coerce, filter, map, weight};
use crate::types::{DataSet, DataType};

static ALL_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

// Prefix-anchored: trailing text after a valid address is tolerated.
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?:[^<>()\[\]\\.,;:\s@"]+(?:\.[^<>()\[\]\\.,;:\s@"]+)*)|(?:".+"))@(?:(?:\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(?:(?:[a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))"#,
    )
    .unwrap()
});

static EXPIRY_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}$").unwrap());

/// Named validation patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Text made only of digits.
    AllDigits,
    /// `local@domain`, domain a dotted hostname with a 2+ letter TLD or a bracketed IPv4.
    Email,
    /// `MM/YY`.
    ExpiryDate,
}

impl Pattern {
    pub fn regex(self) -> &'static Regex {
        match self {
            Self::AllDigits => &ALL_DIGITS,
            Self::Email => &EMAIL,
            Self::ExpiryDate => &EXPIRY_DATE,
        }
    }

    pub fn is_match(self, text: &str) -> bool {
        self.regex().is_match(text)
    }
}

/// What the card-number check removes.
///
/// The default rejects numbers that parse fully as numeric, which is the rule as it stands
/// upstream. The other two settings exist until that rule is confirmed against sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNumberCheck {
    #[default]
    RejectNumeric,
    RejectNonNumeric,
    Off,
}

/// One pipeline step: either a column rewrite or a row filter over one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Designate the row-identifier column. The column must exist.
    SetIndex { column: &'static str },
    /// Remove a column. The column must exist.
    DropColumn { column: &'static str },
    /// Remove whichever of these columns are present.
    DropColumns { columns: &'static [&'static str] },
    Coerce { column: &'static str, to: DataType },
    /// `"NULL"` text becomes missing, across the dataset.
    NormalizeMissingLiteral,
    DropRowsAnyMissing,
    DropRowsAllMissing,
    KeepIn { column: &'static str, allowed: &'static [&'static str] },
    KeepMatching { column: &'static str, pattern: Pattern },
    RejectMatching { column: &'static str, pattern: Pattern },
    Replace { column: &'static str, from: &'static str, to: &'static str },
    StripChars { column: &'static str, chars: &'static [char] },
    KeepDigits { column: &'static str },
    TrimNewlines { column: &'static str },
    /// Apply the configured [`CardNumberCheck`].
    CardNumber { column: &'static str },
    MaxLength { column: &'static str, max: usize },
    /// In rows where `column == equals`, fill every missing cell with `fill`.
    FillMissingWhere { column: &'static str, equals: &'static str, fill: &'static str },
    /// Weight text to kilograms.
    ConvertWeight { column: &'static str },
}

impl Step {
    /// The column this step requires, if any.
    pub fn required_column(&self) -> Option<&'static str> {
        match self {
            Self::SetIndex { column }
            | Self::DropColumn { column }
            | Self::Coerce { column, .. }
            | Self::KeepIn { column, .. }
            | Self::KeepMatching { column, .. }
            | Self::RejectMatching { column, .. }
            | Self::Replace { column, .. }
            | Self::StripChars { column, .. }
            | Self::KeepDigits { column }
            | Self::TrimNewlines { column }
            | Self::CardNumber { column }
            | Self::MaxLength { column, .. }
            | Self::FillMissingWhere { column, .. }
            | Self::ConvertWeight { column } => Some(*column),
            Self::DropColumns { .. }
            | Self::NormalizeMissingLiteral
            | Self::DropRowsAnyMissing
            | Self::DropRowsAllMissing => None,
        }
    }

    /// Apply the step to a caller-owned dataset.
    pub fn apply(
        &self,
        dataset: &mut DataSet,
        kind: DatasetKind,
        card_number_check: CardNumberCheck,
    ) -> EtlResult<()> {
        let idx = match self.required_column() {
            Some(column) => {
                dataset
                    .column_index(column)
                    .ok_or_else(|| EtlError::MissingColumn {
                        kind,
                        column: column.to_string(),
                    })?
            }
            // dataset-wide steps never read it
            None => 0,
        };

        match self {
            Self::SetIndex { column } => dataset.index = Some(column.to_string()),
            Self::DropColumn { column } => {
                dataset.drop_column(column);
            }
            Self::DropColumns { columns } => {
                for column in columns.iter() {
                    dataset.drop_column(column);
                }
            }
            Self::Coerce { to, .. } => coerce::coerce_column(dataset, idx, to),
            Self::NormalizeMissingLiteral => map::normalize_missing_literal(dataset),
            Self::DropRowsAnyMissing => filter::drop_rows_any_missing(dataset),
            Self::DropRowsAllMissing => filter::drop_rows_all_missing(dataset),
            Self::KeepIn { allowed, .. } => filter::filter_isin(dataset, idx, allowed),
            Self::KeepMatching { pattern, .. } => {
                filter::keep_matching(dataset, idx, pattern.regex())
            }
            Self::RejectMatching { pattern, .. } => {
                filter::reject_matching(dataset, idx, pattern.regex())
            }
            Self::Replace { from, to, .. } => map::replace_in_column(dataset, idx, from, to),
            Self::StripChars { chars, .. } => map::strip_chars(dataset, idx, chars),
            Self::KeepDigits { .. } => map::keep_digits(dataset, idx),
            Self::TrimNewlines { .. } => map::trim_and_strip_newlines(dataset, idx),
            Self::CardNumber { .. } => match card_number_check {
                CardNumberCheck::RejectNumeric => filter::reject_numeric(dataset, idx),
                CardNumberCheck::RejectNonNumeric => filter::reject_non_numeric(dataset, idx),
                CardNumberCheck::Off => {}
            },
            Self::MaxLength { max, .. } => filter::reject_longer_than(dataset, idx, *max),
            Self::FillMissingWhere { equals, fill, .. } => {
                map::fill_missing_where(dataset, idx, equals, fill)
            }
            Self::ConvertWeight { .. } => weight::convert_weights(dataset, idx),
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetIndex { column } => write!(f, "set_index({column})"),
            Self::DropColumn { column } => write!(f, "drop_column({column})"),
            Self::DropColumns { columns } => write!(f, "drop_columns({})", columns.join(", ")),
            Self::Coerce { column, to } => write!(f, "coerce({column} -> {to:?})"),
            Self::NormalizeMissingLiteral => f.write_str("normalize_missing_literal"),
            Self::DropRowsAnyMissing => f.write_str("drop_rows_any_missing"),
            Self::DropRowsAllMissing => f.write_str("drop_rows_all_missing"),
            Self::KeepIn { column, .. } => write!(f, "keep_in({column})"),
            Self::KeepMatching { column, pattern } => write!(f, "keep_matching({column}, {pattern:?})"),
            Self::RejectMatching { column, pattern } => {
                write!(f, "reject_matching({column}, {pattern:?})")
            }
            Self::Replace { column, from, to } => write!(f, "replace({column}, {from:?} -> {to:?})"),
            Self::StripChars { column, .. } => write!(f, "strip_chars({column})"),
            Self::KeepDigits { column } => write!(f, "keep_digits({column})"),
            Self::TrimNewlines { column } => write!(f, "trim_and_strip_newlines({column})"),
            Self::CardNumber { column } => write!(f, "card_number_check({column})"),
            Self::MaxLength { column, max } => write!(f, "max_length({column}, {max})"),
            Self::FillMissingWhere { column, equals, fill } => {
                write!(f, "fill_missing_where({column} == {equals:?}, {fill:?})")
            }
            Self::ConvertWeight { column } => write!(f, "convert_weight({column})"),
        }
    }
}
