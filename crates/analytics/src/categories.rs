//! Spend per line-item category.

use std::collections::HashMap;

use serde::Serialize;

use spendlens_core::Money;
use spendlens_invoicing::LineItem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpendRow {
    pub name: String,
    pub value: f64,
}

/// Sum line totals per category, largest first.
///
/// Categories are compared verbatim (no case folding). Equal sums are ordered
/// by category name so the output is stable across stores.
pub fn category_spend(line_items: &[LineItem]) -> Vec<CategorySpendRow> {
    let mut sums: HashMap<&str, Money> = HashMap::new();
    for item in line_items {
        *sums.entry(item.category.as_str()).or_default() += item.unit_price;
    }

    let mut sums: Vec<(&str, Money)> = sums.into_iter().collect();
    sums.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    sums.into_iter()
        .map(|(name, value)| CategorySpendRow {
            name: name.to_string(),
            value: value.to_major(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::line_item;

    #[test]
    fn sums_and_orders_descending() {
        let items = vec![
            line_item("Operations", 1_000),
            line_item("Marketing", 5_000),
            line_item("Operations", 2_500),
            line_item("IT", 100),
        ];

        let rows = category_spend(&items);
        assert_eq!(
            rows,
            vec![
                CategorySpendRow { name: "Marketing".to_string(), value: 50.0 },
                CategorySpendRow { name: "Operations".to_string(), value: 35.0 },
                CategorySpendRow { name: "IT".to_string(), value: 1.0 },
            ]
        );
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let items = vec![line_item("Travel", 700), line_item("Legal", 700)];
        let names: Vec<_> = category_spend(&items).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Legal", "Travel"]);
    }

    #[test]
    fn credit_lines_reduce_a_category() {
        let items = vec![line_item("IT", 1_000), line_item("IT", -1_000), line_item("Office", 10)];
        let rows = category_spend(&items);
        assert_eq!(rows[0], CategorySpendRow { name: "Office".to_string(), value: 0.1 });
        assert_eq!(rows[1], CategorySpendRow { name: "IT".to_string(), value: 0.0 });
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(category_spend(&[]).is_empty());
    }
}
