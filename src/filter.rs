use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    data::{FieldValue, ValueKind, parse_integer, parse_naive_date},
    error::EngineError,
    lots::{Field, LotRecord, LotTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    In,
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOperator {
    fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::In => "in",
            ComparisonOperator::Eq => "=",
            ComparisonOperator::NotEq => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
        }
    }
}

/// A row predicate such as `product_code in A|B` or `test_date >= 2024-01-01`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: ComparisonOperator,
    pub values: Vec<String>,
}

impl FilterCondition {
    pub fn one_of<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.to_string(),
            operator: ComparisonOperator::In,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn compare(column: &str, operator: ComparisonOperator, value: &str) -> Self {
        Self {
            column: column.to_string(),
            operator,
            values: vec![value.to_string()],
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            ComparisonOperator::In => {
                write!(f, "{} in {}", self.column, self.values.join("|"))
            }
            op => write!(
                f,
                "{}{}{}",
                self.column,
                op.symbol(),
                self.values.first().map(String::as_str).unwrap_or("")
            ),
        }
    }
}

pub fn parse_filters(filters: &[String]) -> Result<Vec<FilterCondition>, EngineError> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

pub fn parse_filter(filter: &str) -> Result<FilterCondition, EngineError> {
    let trimmed = filter.trim();
    let invalid = |reason: &str| EngineError::Filter {
        filter: trimmed.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid("empty filter expression"));
    }

    let lowered = trimmed.to_ascii_lowercase();
    if let Some(idx) = lowered.find(" in ")
        && !trimmed[..idx].contains(['=', '<', '>'])
    {
        let column = trimmed[..idx].trim();
        let values = trimmed[idx + " in ".len()..]
            .split('|')
            .map(|v| unquote(v.trim()).to_string())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>();
        if column.is_empty() || values.is_empty() {
            return Err(invalid("membership filters need a column and at least one value"));
        }
        return Ok(FilterCondition {
            column: column.to_string(),
            operator: ComparisonOperator::In,
            values,
        });
    }

    // Leftmost operator wins; at the same position the two-character form does.
    let leftmost = ["!=", ">=", "<=", "=", ">", "<"]
        .into_iter()
        .filter_map(|needle| trimmed.find(needle).map(|idx| (idx, needle)))
        .min_by_key(|(idx, needle)| (*idx, std::cmp::Reverse(needle.len())));
    if let Some((idx, needle)) = leftmost {
        let op = match needle {
            "=" => ComparisonOperator::Eq,
            "!=" => ComparisonOperator::NotEq,
            ">" => ComparisonOperator::Gt,
            ">=" => ComparisonOperator::Ge,
            "<" => ComparisonOperator::Lt,
            "<=" => ComparisonOperator::Le,
            _ => unreachable!(),
        };
        let column = trimmed[..idx].trim();
        if column.is_empty() {
            return Err(invalid("missing column name"));
        }
        let right = trimmed[idx + needle.len()..].trim();
        return Ok(FilterCondition {
            column: column.to_string(),
            operator: op,
            values: vec![unquote(right).to_string()],
        });
    }

    Err(invalid("expected `column in a|b`, or a comparison such as `column>=value`"))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
}

impl Literal {
    fn as_value(&self) -> FieldValue<'_> {
        match self {
            Literal::Text(s) => FieldValue::Text(s),
            Literal::Integer(i) => FieldValue::Integer(*i),
            Literal::Date(d) => FieldValue::Date(*d),
        }
    }
}

/// A condition whose literals have been coerced to the column's type.
#[derive(Debug)]
pub(crate) struct CompiledFilter {
    column: String,
    operator: ComparisonOperator,
    literals: Vec<Literal>,
}

impl CompiledFilter {
    pub(crate) fn compile(condition: &FilterCondition, table: &LotTable) -> Result<Self, EngineError> {
        if !table.has_column(&condition.column) {
            return Err(EngineError::Schema {
                operation: "filtering",
                missing: vec![condition.column.clone()],
            });
        }
        let kind = Field::from_name(&condition.column)
            .map(|field| field.kind())
            .unwrap_or(ValueKind::Text);
        let literals = condition
            .values
            .iter()
            .map(|raw| coerce_literal(raw, kind))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| EngineError::Filter {
                filter: condition.to_string(),
                reason,
            })?;
        if literals.is_empty() {
            return Err(EngineError::Filter {
                filter: condition.to_string(),
                reason: "no value to compare against".to_string(),
            });
        }
        Ok(Self {
            column: condition.column.clone(),
            operator: condition.operator,
            literals,
        })
    }

    pub(crate) fn matches(&self, row: &LotRecord) -> bool {
        use ComparisonOperator::*;
        let candidate = row.column_value(&self.column);
        let first = self.literals[0].as_value();
        match (self.operator, candidate) {
            (In, Some(value)) => self.literals.iter().any(|lit| lit.as_value() == value),
            (NotEq, None) => true,
            (_, None) => false,
            (Eq, Some(value)) => value == first,
            (NotEq, Some(value)) => value != first,
            (Gt, Some(value)) => value > first,
            (Ge, Some(value)) => value >= first,
            (Lt, Some(value)) => value < first,
            (Le, Some(value)) => value <= first,
        }
    }
}

fn coerce_literal(raw: &str, kind: ValueKind) -> Result<Literal, String> {
    match kind {
        ValueKind::Text => Ok(Literal::Text(raw.to_string())),
        ValueKind::Integer | ValueKind::Quantity => parse_integer(raw)
            .map(Literal::Integer)
            .map_err(|err| err.to_string()),
        ValueKind::Date => parse_naive_date(raw)
            .map(Literal::Date)
            .map_err(|err| err.to_string()),
    }
}

/// Keeps the rows that satisfy every condition, preserving their order.
pub fn apply_filters(table: LotTable, conditions: &[FilterCondition]) -> Result<LotTable, EngineError> {
    if conditions.is_empty() {
        return Ok(table);
    }
    let compiled = conditions
        .iter()
        .map(|condition| CompiledFilter::compile(condition, &table))
        .collect::<Result<Vec<_>, _>>()?;
    let LotTable { columns, rows } = table;
    let rows = rows
        .into_iter()
        .filter(|row| compiled.iter().all(|filter| filter.matches(row)))
        .collect();
    Ok(LotTable { columns, rows })
}
