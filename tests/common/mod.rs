//! Shared test fixtures: a small invoicing domain with one simple
//! sub-object, a flat tag collection, and a two-level line/allocation
//! hierarchy.
#![allow(dead_code)]

use chrono::NaiveDateTime;
use table_fixtures_sdk::builder::FixtureBuilder;
use table_fixtures_sdk::hierarchy::{HierarchyShape, KeyComponent};
use table_fixtures_sdk::mapping::EntityMapping;
use table_fixtures_sdk::models::{Entity, ModelError, Value, ValueKind};
use table_fixtures_sdk::storage::{EntityStore, MemoryStore};
use table_fixtures_sdk::verifier::FixtureVerifier;

/// Simple single-valued sub-object hydrated from the same row.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BillingAddress {
    pub city: String,
    pub street: String,
}

impl Entity for BillingAddress {
    fn properties() -> &'static [(&'static str, ValueKind)] {
        &[("City", ValueKind::Text), ("Street", ValueKind::Text)]
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "City" => Some(Value::Text(self.city.clone())),
            "Street" => Some(Value::Text(self.street.clone())),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<(), ModelError> {
        match (property, value) {
            ("City", Value::Text(city)) => self.city = city,
            ("Street", Value::Text(street)) => self.street = street,
            (property, value) => return Err(Self::kind_mismatch(property, value)),
        }
        Ok(())
    }
}

/// One cell of a `Tag.`-prefixed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// One `Line.Product` cell; the line number comes from the hierarchy key.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub number: i32,
    pub product: String,
}

/// One `Allocation.Amount` cell; owned by the root invoice, grouped by the
/// (line number, slot) composite key.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAllocation {
    pub line: i32,
    pub slot: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub number: String,
    pub customer: String,
    pub currency: String,
    pub total: f64,
    pub issued_on: NaiveDateTime,
    pub billing: BillingAddress,
    pub tags: Vec<Tag>,
    pub lines: Vec<InvoiceLine>,
    pub allocations: Vec<LineAllocation>,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            number: String::new(),
            customer: String::new(),
            currency: String::new(),
            total: 0.0,
            issued_on: NaiveDateTime::MIN,
            billing: BillingAddress::default(),
            tags: Vec::new(),
            lines: Vec::new(),
            allocations: Vec::new(),
        }
    }
}

impl Entity for Invoice {
    fn properties() -> &'static [(&'static str, ValueKind)] {
        &[
            ("Number", ValueKind::Text),
            ("Customer", ValueKind::Text),
            ("Currency", ValueKind::Text),
            ("Total", ValueKind::Double),
            ("IssuedOn", ValueKind::DateTime),
        ]
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "Number" => Some(Value::Text(self.number.clone())),
            "Customer" => Some(Value::Text(self.customer.clone())),
            "Currency" => Some(Value::Text(self.currency.clone())),
            "Total" => Some(Value::Double(self.total)),
            "IssuedOn" => Some(Value::DateTime(self.issued_on)),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<(), ModelError> {
        match (property, value) {
            ("Number", Value::Text(number)) => self.number = number,
            ("Customer", Value::Text(customer)) => self.customer = customer,
            ("Currency", Value::Text(currency)) => self.currency = currency,
            ("Total", Value::Double(total)) => self.total = total,
            ("IssuedOn", Value::DateTime(issued_on)) => self.issued_on = issued_on,
            (property, value) => return Err(Self::kind_mismatch(property, value)),
        }
        Ok(())
    }
}

/// Mapping for [`Invoice`] with a configurable identity column.
pub fn invoice_mapping(has_identity: bool) -> EntityMapping {
    EntityMapping {
        table_name: "dbo.Invoices".to_string(),
        keys: vec!["InvoiceNumber".to_string()],
        has_identity,
        properties: vec![
            ("Number".to_string(), "InvoiceNumber".to_string()),
            ("Customer".to_string(), "CustomerName".to_string()),
            ("Currency".to_string(), "Currency".to_string()),
            ("Total".to_string(), "TotalAmount".to_string()),
            ("IssuedOn".to_string(), "IssuedOn".to_string()),
        ],
    }
}

/// Fresh in-memory store for invoices.
pub fn invoice_store() -> MemoryStore<Invoice> {
    MemoryStore::new(invoice_mapping(false))
}

/// Hierarchy shape of the line collection: depth 1, keyed by the `Line`
/// column.
pub fn line_shape() -> HierarchyShape {
    HierarchyShape::single("Line", ValueKind::Int)
}

/// Hierarchy shape of the allocation collection: depth 2, keyed by the
/// (`Line`, `Slot`) composite.
pub fn allocation_shape() -> HierarchyShape {
    HierarchyShape::composite(vec![
        KeyComponent::new("Line", ValueKind::Int),
        KeyComponent::new("Slot", ValueKind::Text),
    ])
}

/// Standard build-side route configuration: tags fan out per cell at depth
/// 0, lines live at depth 1, allocations at depth 2 on the root invoice.
pub fn invoice_build_routes<'a, S>(
    builder: FixtureBuilder<'a, Invoice, S>,
) -> FixtureBuilder<'a, Invoice, S>
where
    S: EntityStore<Invoice>,
{
    builder
        .collection_include(
            |invoice: &mut Invoice| &mut invoice.tags,
            "Tag.",
            |_, header, cell| {
                (!cell.is_empty()).then(|| Tag {
                    name: header.trim_start_matches("Tag.").to_string(),
                    value: cell.to_string(),
                })
            },
        )
        .nested_collection_include(
            |invoice: &mut Invoice| &mut invoice.lines,
            "Line.",
            line_shape(),
            |_, _, cell, key| {
                let number = key.get(0)?.as_int()?;
                (!cell.is_empty()).then(|| InvoiceLine {
                    number,
                    product: cell.to_string(),
                })
            },
        )
        .nested_collection_include(
            |invoice: &mut Invoice| &mut invoice.allocations,
            "Allocation.",
            allocation_shape(),
            |_, _, cell, key| {
                let line = key.get(0)?.as_int()?;
                let slot = key.get(1)?.as_text()?.to_string();
                let amount = cell.parse().ok()?;
                Some(LineAllocation { line, slot, amount })
            },
        )
}

/// Standard check-side route configuration mirroring
/// [`invoice_build_routes`]: empty cells assert nothing, non-empty cells
/// must have a matching element in the found invoice.
pub fn invoice_check_routes<'a, S>(
    verifier: FixtureVerifier<'a, Invoice, S>,
) -> FixtureVerifier<'a, Invoice, S>
where
    S: EntityStore<Invoice>,
{
    verifier
        .collection_include("Tag.", |invoice: &Invoice, header, cell| {
            if cell.is_empty() {
                return Ok(());
            }

            let name = header.trim_start_matches("Tag.");
            invoice
                .tags
                .iter()
                .any(|tag| tag.name == name && tag.value == cell)
                .then_some(())
                .ok_or_else(|| format!("no tag {name}={cell}"))
        })
        .nested_collection_include("Line.", line_shape(), |invoice: &Invoice, _, cell, key| {
            if cell.is_empty() {
                return Ok(());
            }

            let number = key.get(0).and_then(|scalar| scalar.as_int());
            invoice
                .lines
                .iter()
                .any(|line| Some(line.number) == number && line.product == cell)
                .then_some(())
                .ok_or_else(|| format!("no line {number:?} with product {cell}"))
        })
        .nested_collection_include(
            "Allocation.",
            allocation_shape(),
            |invoice: &Invoice, _, cell, key| {
                if cell.is_empty() {
                    return Ok(());
                }

                let line = key.get(0).and_then(|scalar| scalar.as_int());
                let slot = key.get(1).and_then(|scalar| scalar.as_text());
                let amount: f64 = cell
                    .parse()
                    .map_err(|_| format!("unparseable amount {cell}"))?;
                invoice
                    .allocations
                    .iter()
                    .any(|allocation| {
                        Some(allocation.line) == line
                            && Some(allocation.slot.as_str()) == slot
                            && allocation.amount == amount
                    })
                    .then_some(())
                    .ok_or_else(|| format!("no allocation {line:?}/{slot:?} of {amount}"))
            },
        )
}

/// Standard two-invoice fixture table exercising every route depth.
pub fn invoice_table() -> table_fixtures_sdk::models::Table {
    table_fixtures_sdk::models::Table::parse(
        "| Number | Customer | Total | Line | Slot | Tag.Color | Line.Product | Allocation.Amount |
         | I-1    | ACME     | 100.5 |      |      | red       |              |                   |
         |        |          |       | 1    |      |           | anvil        |                   |
         |        |          |       |      | a    |           |              | 40.5              |
         |        |          |       |      | b    |           |              | 60                |
         |        |          |       | 2    |      |           | rocket       |                   |
         | I-2    | Tyrell   | 50    |      |      | blue      |              |                   |",
    )
    .expect("fixture table parses")
}
