//! Validation and cleaning engine.
//!
//! One generic engine interprets a declarative rule table per [`DatasetKind`]:
//!
//! | Kind | What the pipeline does |
//! |---|---|
//! | `users` | index, text/date coercion, all-digit name rejection, email grammar, address tidy, country and country-code allow-lists, drop all-missing rows |
//! | `card_details` | drop all-missing rows, `?` removal, card-number check, length ≤ 19, provider allow-list, `MM/YY` expiry |
//! | `store_details` | drop `lat`, digits-only staff numbers, numeric coordinates, country-code allow-list, continent fix, Web Portal `N/A` fill, drop any-missing rows |
//! | `product_details` | drop any-missing rows, `removed` allow-list, weight to kilograms, currency to numeric |
//! | `orders` | index, drop upstream join artifacts |
//! | `events` | `time_period` allow-list |
//!
//! See [`rules`] for the exact step lists.

mod engine;
mod kind;
pub mod rules;
pub mod step;

pub use engine::{check_columns, clean, clean_with, CleaningOptions};
pub use kind::DatasetKind;
pub use rules::{rules_for, KindRules};
pub use step::{CardNumberCheck, Pattern, Step};
