//! Domain-specific assertion macros for scope harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear which join or batching guarantee was violated.

// ---------------------------------------------------------------------------
// Table assertions
// ---------------------------------------------------------------------------

/// Assert the `_id` column of a table, in row order.
///
/// ```rust
/// assert_ids!(table, [1, 2]);
/// ```
#[macro_export]
macro_rules! assert_ids {
    ($table:expr, [$($id:expr),* $(,)?]) => {{
        let table: &scope::Table = &$table;
        let actual = table.ids();
        let expected: Vec<serde_json::Value> = vec![$(serde_json::json!($id)),*];
        pretty_assertions::assert_eq!(
            actual, expected,
            "assert_ids! failed: table _id column differs ({} rows)", table.len()
        );
    }};
}

/// Assert that a table has a column.
#[macro_export]
macro_rules! assert_has_column {
    ($table:expr, $column:expr) => {{
        let table: &scope::Table = &$table;
        let column: &str = $column;
        if !table.columns().iter().any(|c| c == column) {
            panic!(
                "assert_has_column! failed: {:?} not found.\n  Available: {:?}",
                column,
                table.columns()
            );
        }
    }};
}

// ---------------------------------------------------------------------------
// Batch failure assertions
// ---------------------------------------------------------------------------

/// Assert that a batch outcome reports a failure for `field` on `catalog`.
///
/// ```rust
/// assert_failed_field!(outcome, "f2", FEATURES);
/// ```
#[macro_export]
macro_rules! assert_failed_field {
    ($outcome:expr, $field:expr, $catalog:expr) => {{
        let outcome: &scope::BatchOutcome = &$outcome;
        let field = scope::FieldId::from($field);
        let catalog: &str = $catalog;
        if !outcome
            .failures
            .iter()
            .any(|f| f.field == field && f.catalog == catalog)
        {
            panic!(
                "assert_failed_field! failed: no failure for field {} on {}.\n  Reported: {:?}",
                field,
                catalog,
                outcome.failures.iter().map(|f| f.to_string()).collect::<Vec<_>>()
            );
        }
    }};
}
