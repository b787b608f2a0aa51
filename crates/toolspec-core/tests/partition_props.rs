// crates/toolspec-core/tests/partition_props.rs
// ============================================================================
// Module: Whitelist Partition Property Tests
// Description: Property coverage for canonicalization and partitioning.
// ============================================================================
//! ## Overview
//! Property tests asserting that partitioning is total and lossless over
//! arbitrary observed-tool sets and that canonicalization is idempotent.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeSet;

use proptest::prelude::proptest;
use proptest::prop_assert;
use proptest::prop_assert_eq;
use toolspec_core::ToolSlug;
use toolspec_core::WhitelistRegistry;
use toolspec_core::canonicalize;

proptest! {
    /// Every observed slug lands in exactly one partition bucket.
    #[test]
    fn partition_is_total_and_disjoint(raw in proptest::collection::btree_set("[a-zA-Z0-9_:./@-]{1,40}", 0..24)) {
        let registry = WhitelistRegistry::default();
        let observed: BTreeSet<ToolSlug> =
            raw.iter().map(|name| ToolSlug::from(name.as_str())).collect();
        let partitioned = registry.partition(&observed);
        prop_assert!(partitioned.public.is_disjoint(&partitioned.unknown));
        prop_assert_eq!(partitioned.public.len() + partitioned.unknown.len(), observed.len());
        let mut recombined = partitioned.public;
        recombined.extend(partitioned.unknown);
        prop_assert_eq!(recombined, observed);
    }

    /// Canonicalization applied twice agrees with one application.
    #[test]
    fn canonicalize_is_idempotent(raw in "\\PC{0,64}") {
        if let Some(first) = canonicalize(&raw) {
            prop_assert_eq!(canonicalize(&first), Some(first.clone()));
        }
    }

    /// Whitelist membership never panics on arbitrary input.
    #[test]
    fn is_public_is_total(raw in "\\PC{0,80}") {
        let registry = WhitelistRegistry::default();
        let _ = registry.is_public(&raw);
    }
}
