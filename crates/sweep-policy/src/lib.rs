//! Retention policy catalog and anonymization rules.
//!
//! A [`sweep_core::Policy`] describes which rows of an entity family are
//! candidates for deletion or anonymization and what the anonymization does
//! to each field. This crate provides the built-in catalog (one entry per
//! entity family and commercial nature, gated by feature flags) and the pure
//! field-rule transform applied during the anonymize pass.

pub mod catalog;
pub mod rules;

pub use catalog::builtin_policies;
pub use rules::apply_field_rules;
