use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{
    error::EngineError,
    lots::{Field, LotTable},
    overlap::partition_by_code,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductYieldStat {
    pub product_code: String,
    pub tested_total: i64,
    pub good_total: i64,
    pub defect_count: i64,
    pub yield_rate: f64,
    pub defect_rate: f64,
}

impl ProductYieldStat {
    pub fn from_totals(product_code: &str, tested_total: i64, good_total: i64) -> Self {
        let defect_count = tested_total - good_total;
        Self {
            product_code: product_code.to_string(),
            tested_total,
            good_total,
            defect_count,
            yield_rate: percentage(good_total, tested_total),
            defect_rate: percentage(defect_count, tested_total),
        }
    }
}

/// `part / whole * 100` rounded half-to-even to one decimal place on the exact
/// decimal quotient; `0.0` when nothing was tested.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    Decimal::from(part)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(Decimal::from(whole)))
        .map(|rate| rate.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven))
        .and_then(|rate| rate.to_f64())
        .unwrap_or(0.0)
}

/// One stat per product code, ascending by code. Missing quantities count as
/// zero.
pub fn aggregate_yield(table: &LotTable) -> Result<Vec<ProductYieldStat>, EngineError> {
    table.require("yield aggregation", &[Field::ProductCode])?;

    let stats = partition_by_code(&table.rows)
        .into_iter()
        .map(|(code, group)| {
            let (tested, good) = group.iter().fold((0i64, 0i64), |(tested, good), row| {
                (
                    tested.saturating_add(row.tested_qty.unwrap_or(0)),
                    good.saturating_add(row.good_qty.unwrap_or(0)),
                )
            });
            ProductYieldStat::from_totals(code, tested, good)
        })
        .collect();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lots::LotRecord;

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 8), 12.5);
        assert_eq!(percentage(1, 16), 6.2);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(275, 300), 91.7);
        assert_eq!(percentage(940, 1050), 89.5);
        assert_eq!(percentage(-3, 1000), -0.3);
    }

    #[test]
    fn groups_sum_quantities_treating_missing_as_zero() {
        let table = LotTable::with_fields(
            &[Field::ProductCode, Field::TestedQty, Field::GoodQty],
            vec![
                LotRecord::new("B").with_quantities(Some(100), Some(90)),
                LotRecord::new("A").with_quantities(Some(50), None),
                LotRecord::new("B").with_quantities(None, Some(5)),
            ],
        );
        let stats = aggregate_yield(&table).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].product_code, "A");
        assert_eq!(stats[0].good_total, 0);
        assert_eq!(stats[0].defect_rate, 100.0);
        assert_eq!(stats[1].tested_total, 100);
        assert_eq!(stats[1].good_total, 95);
        assert_eq!(stats[1].yield_rate, 95.0);
    }
}
