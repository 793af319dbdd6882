use std::collections::BTreeMap;

use crate::recipes::repo::CartIngredientRow;

/// One line of the exported shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Groups the raw cart lines by (name, unit) and sums the amounts. The
/// BTreeMap keeps the output ordered by ingredient name, which is all the
/// ordering the export needs.
pub fn aggregate(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListItem {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Plain-text rendering served as the downloadable attachment.
pub fn render(items: &[ShoppingListItem]) -> String {
    let mut out = String::from("Shopping list\n\n");
    for item in items {
        out.push_str(&format!(
            "{} ({}): {}\n",
            item.name, item.measurement_unit, item.total
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.into(),
            measurement_unit: unit.into(),
            amount,
        }
    }

    #[test]
    fn sums_amounts_across_recipes() {
        // Recipe A: flour 100 g; recipe B: flour 50 g, sugar 20 g
        let items = aggregate(vec![
            row("flour", "g", 100),
            row("flour", "g", 50),
            row("sugar", "g", 20),
        ]);
        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: "flour".into(),
                    measurement_unit: "g".into(),
                    total: 150,
                },
                ShoppingListItem {
                    name: "sugar".into(),
                    measurement_unit: "g".into(),
                    total: 20,
                },
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let items = aggregate(vec![row("milk", "ml", 200), row("milk", "g", 30)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn empty_cart_aggregates_to_nothing() {
        assert!(aggregate(vec![]).is_empty());
    }

    #[test]
    fn totals_do_not_overflow_small_int_sums() {
        let rows = vec![row("flour", "g", 32_000), row("flour", "g", 32_000)];
        assert_eq!(aggregate(rows)[0].total, 64_000);
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let text = render(&aggregate(vec![
            row("flour", "g", 100),
            row("flour", "g", 50),
            row("sugar", "g", 20),
        ]));
        assert!(text.starts_with("Shopping list\n"));
        assert!(text.contains("flour (g): 150\n"));
        assert!(text.contains("sugar (g): 20\n"));
    }
}
