//! Typed lot records built from a normalized table.
//!
//! Every canonical column name maps to a [`Field`]; the engine interprets the
//! product code, lot number, dates, serial bounds and quantities and carries
//! everything else through untouched.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    data::{FieldValue, ValueKind, is_blank, parse_integer, parse_naive_date},
    error::{CoercionWarning, EngineError},
    normalize::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Package,
    PartNo,
    ProductCode,
    LotNo,
    DateCode,
    TestDate,
    ShipDate,
    BoxNo,
    SerialStart,
    SerialEnd,
    InQty,
    CurrQty,
    TestedQty,
    GoodQty,
    Yield,
    Notes,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Package,
        Field::PartNo,
        Field::ProductCode,
        Field::LotNo,
        Field::DateCode,
        Field::TestDate,
        Field::ShipDate,
        Field::BoxNo,
        Field::SerialStart,
        Field::SerialEnd,
        Field::InQty,
        Field::CurrQty,
        Field::TestedQty,
        Field::GoodQty,
        Field::Yield,
        Field::Notes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Package => "package",
            Field::PartNo => "part_no",
            Field::ProductCode => "product_code",
            Field::LotNo => "lot_no",
            Field::DateCode => "date_code",
            Field::TestDate => "test_date",
            Field::ShipDate => "ship_date",
            Field::BoxNo => "box_no",
            Field::SerialStart => "serial_start",
            Field::SerialEnd => "serial_end",
            Field::InQty => "in_qty",
            Field::CurrQty => "curr_qty",
            Field::TestedQty => "tested_qty",
            Field::GoodQty => "good_qty",
            Field::Yield => "yield",
            Field::Notes => "notes",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Field::TestDate | Field::ShipDate => ValueKind::Date,
            Field::SerialStart | Field::SerialEnd => ValueKind::Integer,
            Field::TestedQty | Field::GoodQty => ValueKind::Quantity,
            _ => ValueKind::Text,
        }
    }

    /// Fields parsed into typed struct members rather than carried as text.
    fn is_interpreted(&self) -> bool {
        matches!(
            self,
            Field::ProductCode
                | Field::LotNo
                | Field::TestDate
                | Field::ShipDate
                | Field::SerialStart
                | Field::SerialEnd
                | Field::TestedQty
                | Field::GoodQty
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_name(s.trim()).ok_or_else(|| format!("Unknown lot field '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotRecord {
    pub product_code: Option<String>,
    pub lot_no: Option<String>,
    pub test_date: Option<NaiveDate>,
    pub ship_date: Option<NaiveDate>,
    pub serial_start: Option<i64>,
    pub serial_end: Option<i64>,
    pub tested_qty: Option<i64>,
    pub good_qty: Option<i64>,
    /// Descriptive columns keyed by canonical name; blank cells are omitted.
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, String>,
    /// Original text of interpreted cells that failed coercion.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unparsed: BTreeMap<String, String>,
}

impl LotRecord {
    pub fn new(product_code: &str) -> Self {
        Self {
            product_code: Some(product_code.to_string()),
            ..Self::default()
        }
    }

    pub fn with_serials(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.serial_start = start;
        self.serial_end = end;
        self
    }

    pub fn with_quantities(mut self, tested: Option<i64>, good: Option<i64>) -> Self {
        self.tested_qty = tested;
        self.good_qty = good;
        self
    }

    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::ProductCode => self.product_code.as_deref().map(FieldValue::Text),
            Field::LotNo => self.lot_no.as_deref().map(FieldValue::Text),
            Field::TestDate => self.test_date.map(FieldValue::Date),
            Field::ShipDate => self.ship_date.map(FieldValue::Date),
            Field::SerialStart => self.serial_start.map(FieldValue::Integer),
            Field::SerialEnd => self.serial_end.map(FieldValue::Integer),
            Field::TestedQty => self.tested_qty.map(FieldValue::Integer),
            Field::GoodQty => self.good_qty.map(FieldValue::Integer),
            other => self.text(other.name()).map(FieldValue::Text),
        }
    }

    /// Value of any column, including ones the engine has no [`Field`] for.
    pub fn column_value(&self, column: &str) -> Option<FieldValue<'_>> {
        match Field::from_name(column) {
            Some(field) => self.value(field),
            None => self.text(column).map(FieldValue::Text),
        }
    }

    fn text(&self, column: &str) -> Option<&str> {
        self.passthrough.get(column).map(String::as_str)
    }

    /// Text for an output cell. Cells that could not be coerced are written
    /// back as they were read.
    pub fn render_cell(&self, column: &str) -> String {
        match self.column_value(column) {
            Some(value) => value.to_string(),
            None => self.unparsed.get(column).cloned().unwrap_or_default(),
        }
    }
}

/// Lot records plus the normalized column list they were read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotTable {
    pub columns: Vec<String>,
    pub rows: Vec<LotRecord>,
}

impl LotTable {
    pub fn new(columns: Vec<String>, rows: Vec<LotRecord>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table whose schema holds exactly the given fields.
    pub fn with_fields(fields: &[Field], rows: Vec<LotRecord>) -> Self {
        Self {
            columns: fields.iter().map(|f| f.name().to_string()).collect(),
            rows,
        }
    }

    /// Coerces a normalized table. Cells that fail coercion become missing and
    /// are reported in the returned warnings.
    pub fn from_table(table: &Table) -> (Self, Vec<CoercionWarning>) {
        let fields = table
            .headers
            .iter()
            .map(|header| Field::from_name(header))
            .collect::<Vec<_>>();
        let mut warnings = Vec::new();
        let mut rows = Vec::with_capacity(table.rows.len());

        for (row_idx, raw) in table.rows.iter().enumerate() {
            let mut record = LotRecord::default();
            for (col_idx, cell) in raw.iter().enumerate() {
                if is_blank(cell) {
                    continue;
                }
                let Some(header) = table.headers.get(col_idx) else {
                    continue;
                };
                let field = fields[col_idx];
                match field {
                    Some(field) if field.is_interpreted() => {
                        if let Err(kind) = assign(&mut record, field, cell) {
                            record.unparsed.insert(header.clone(), cell.clone());
                            warnings.push(CoercionWarning {
                                row: row_idx + 1,
                                column: header.clone(),
                                value: cell.clone(),
                                expected: kind,
                            });
                        }
                    }
                    _ => {
                        record.passthrough.insert(header.clone(), cell.clone());
                    }
                }
            }
            rows.push(record);
        }

        (
            Self {
                columns: table.headers.clone(),
                rows,
            },
            warnings,
        )
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.columns.iter().any(|column| column == field.name())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Fails with a schema error naming every field in `fields` the table lacks.
    pub fn require(&self, operation: &'static str, fields: &[Field]) -> Result<(), EngineError> {
        let missing = fields
            .iter()
            .filter(|field| !self.has_field(**field))
            .map(|field| field.name().to_string())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Schema { operation, missing })
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().map(|c| row.render_cell(c)).collect())
            .collect()
    }
}

fn assign(record: &mut LotRecord, field: Field, cell: &str) -> Result<(), ValueKind> {
    let kind = field.kind();
    match field {
        Field::ProductCode => record.product_code = Some(cell.to_string()),
        Field::LotNo => record.lot_no = Some(cell.to_string()),
        Field::TestDate => record.test_date = Some(parse_naive_date(cell).map_err(|_| kind)?),
        Field::ShipDate => record.ship_date = Some(parse_naive_date(cell).map_err(|_| kind)?),
        Field::SerialStart => record.serial_start = Some(parse_integer(cell).map_err(|_| kind)?),
        Field::SerialEnd => record.serial_end = Some(parse_integer(cell).map_err(|_| kind)?),
        Field::TestedQty => record.tested_qty = Some(parse_quantity(cell).ok_or(kind)?),
        Field::GoodQty => record.good_qty = Some(parse_quantity(cell).ok_or(kind)?),
        _ => {}
    }
    Ok(())
}

fn parse_quantity(cell: &str) -> Option<i64> {
    parse_integer(cell).ok().filter(|qty| *qty >= 0)
}
