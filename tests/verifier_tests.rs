//! Verify-path ("Then") tests

mod common;

use common::*;
use table_fixtures_sdk::builder::FixtureBuilder;
use table_fixtures_sdk::models::{Table, Value};
use table_fixtures_sdk::verifier::{FixtureVerifier, VerifyError};

/// Build the standard fixture into a fresh store.
fn populated_store() -> table_fixtures_sdk::storage::MemoryStore<Invoice> {
    let mut store = invoice_store();
    invoice_build_routes(FixtureBuilder::new(&mut store))
        .execute(&invoice_table())
        .unwrap();
    store
}

mod lookups {
    use super::*;

    #[test]
    fn at_least_one_lookup_property_is_required() {
        let store = populated_store();
        let err = FixtureVerifier::new(&store)
            .execute(&invoice_table())
            .unwrap_err();

        assert!(matches!(err, VerifyError::NoLookupProperties));
    }

    #[test]
    fn missing_entities_abort_with_the_row_number() {
        let store = invoice_store();
        let table = Table::parse(
            "| Number |
             | I-404  |",
        )
        .unwrap();

        let err = FixtureVerifier::new(&store)
            .lookup_property("Number")
            .execute(&table)
            .unwrap_err();

        assert!(matches!(err, VerifyError::EntityNotFound { row: 0 }));
    }

    #[test]
    fn lookup_defaults_fill_unset_lookup_values() {
        let store = populated_store();

        // No Customer column: the transient entity's customer stays at its
        // canonical default and the lookup default takes over.
        let table = Table::parse(
            "| Number |
             | I-2    |",
        )
        .unwrap();

        let found = FixtureVerifier::new(&store)
            .lookup_property("Number")
            .lookup_property_or("Customer", Value::Text("Tyrell".into()))
            .execute(&table)
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer, "Tyrell");
    }

    #[test]
    fn lookup_defaults_never_overwrite_table_values() {
        let store = populated_store();
        let table = Table::parse(
            "| Number | Customer |
             | I-2    | Wrong    |",
        )
        .unwrap();

        let err = FixtureVerifier::new(&store)
            .lookup_property("Number")
            .lookup_property_or("Customer", Value::Text("Tyrell".into()))
            .execute(&table)
            .unwrap_err();

        assert!(matches!(err, VerifyError::EntityNotFound { row: 0 }));
    }
}

mod scalar_checks {
    use super::*;

    #[test]
    fn matching_scalars_pass() {
        let store = populated_store();
        let table = Table::parse(
            "| Number | Customer | Total |
             | I-1    | ACME     | 100.5 |
             | I-2    | Tyrell   | 50    |",
        )
        .unwrap();

        let found = FixtureVerifier::new(&store)
            .lookup_property("Number")
            .execute(&table)
            .unwrap();

        assert_eq!(found.len(), 2);
    }

    #[test]
    fn mismatched_scalars_abort_with_details() {
        let store = populated_store();
        let table = Table::parse(
            "| Number | Total |
             | I-1    | 999   |",
        )
        .unwrap();

        let err = FixtureVerifier::new(&store)
            .lookup_property("Number")
            .execute(&table)
            .unwrap_err();

        match err {
            VerifyError::PropertyMismatch {
                row,
                property,
                expected,
                actual,
            } => {
                assert_eq!(row, 0);
                assert_eq!(property, "Total");
                assert_eq!(expected, Value::Double(999.0));
                assert_eq!(actual, Value::Double(100.5));
            }
            other => panic!("expected property mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_columns_are_not_supported() {
        let store = populated_store();
        let table = Table::parse(
            "| Number | Nonsense |
             | I-1    | x        |",
        )
        .unwrap();

        let err = FixtureVerifier::new(&store)
            .lookup_property("Number")
            .execute(&table)
            .unwrap_err();

        assert!(matches!(
            err,
            VerifyError::UnsupportedColumn { ref column } if column == "Nonsense"
        ));
    }
}

mod collection_checks {
    use super::*;

    #[test]
    fn round_trip_build_then_verify_succeeds() -> anyhow::Result<()> {
        let mut store = invoice_store();
        invoice_build_routes(FixtureBuilder::new(&mut store)).execute(&invoice_table())?;

        let found = invoice_check_routes(FixtureVerifier::new(&store))
            .lookup_property("Number")
            .execute(&invoice_table())?;

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].number, "I-1");
        assert_eq!(found[1].number, "I-2");
        Ok(())
    }

    #[test]
    fn flat_collection_mismatches_surface_the_cell() {
        let store = populated_store();
        let table = Table::parse(
            "| Number | Line | Slot | Tag.Color |
             | I-1    |      |      | green     |",
        )
        .unwrap();

        let err = invoice_check_routes(FixtureVerifier::new(&store))
            .lookup_property("Number")
            .execute(&table)
            .unwrap_err();

        match err {
            VerifyError::CollectionCell { row, column, message } => {
                assert_eq!(row, 0);
                assert_eq!(column, "Tag.Color");
                assert_eq!(message, "no tag Color=green");
            }
            other => panic!("expected collection cell error, got {other:?}"),
        }
    }

    #[test]
    fn nested_collection_mismatches_use_the_key_tuple() {
        let store = populated_store();

        // Allocation (1, a) exists but with amount 40.5, not 99.
        let table = Table::parse(
            "| Number | Line | Slot | Line.Product | Allocation.Amount |
             | I-1    |      |      |              |                   |
             |        | 1    |      | anvil        |                   |
             |        |      | a    |              | 99                |",
        )
        .unwrap();

        let err = invoice_check_routes(FixtureVerifier::new(&store))
            .lookup_property("Number")
            .execute(&table)
            .unwrap_err();

        match err {
            VerifyError::CollectionCell { row, column, message } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Allocation.Amount");
                assert!(message.contains("no allocation"));
            }
            other => panic!("expected collection cell error, got {other:?}"),
        }
    }

    #[test]
    fn deep_rows_verify_against_their_own_root() {
        let store = populated_store();

        // Claim I-2 owns I-1's line: the line check runs against the I-2
        // invoice, which has no lines.
        let table = Table::parse(
            "| Number | Line | Slot | Line.Product |
             | I-2    |      |      |              |
             |        | 1    |      | anvil        |",
        )
        .unwrap();

        let err = invoice_check_routes(FixtureVerifier::new(&store))
            .lookup_property("Number")
            .execute(&table)
            .unwrap_err();

        assert!(matches!(err, VerifyError::CollectionCell { row: 1, .. }));
    }
}
