use std::collections::HashMap;

use serde::Serialize;

use crate::schema::CartQuantity;

/// One consolidated line of the shopping list export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListRow {
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}

/// Folds every quantity row of a user's cart into one list, keyed by
/// ingredient name. The first occurrence of a name fixes its position and its
/// measurement unit; later occurrences only add to the running total.
/// Same-named ingredients with different units are merged all the same, but
/// the mismatch is logged so it shows up in monitoring.
pub fn aggregate_quantities(rows: impl IntoIterator<Item = CartQuantity>) -> Vec<ShoppingListRow> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut list: Vec<ShoppingListRow> = Vec::new();

    for row in rows {
        match index.get(&row.name) {
            Some(i) => {
                let entry = &mut list[*i];
                if entry.measurement_unit != row.measurement_unit {
                    log::warn!(
                        "Merging mismatched units for '{}': {} vs {}",
                        row.name,
                        entry.measurement_unit,
                        row.measurement_unit
                    );
                }
                entry.amount += i64::from(row.amount);
            }
            None => {
                index.insert(row.name.clone(), list.len());
                list.push(ShoppingListRow {
                    name: row.name,
                    amount: i64::from(row.amount),
                    measurement_unit: row.measurement_unit,
                });
            }
        }
    }

    list
}

/// Renders the aggregated list as a CSV document with a header row.
pub fn render_csv(rows: &[ShoppingListRow]) -> String {
    let mut out = String::from("Ingredient name,Ingredient amount,Measurement unit\r\n");

    for row in rows {
        out += &format!(
            "{},{},{}\r\n",
            escape_field(&row.name),
            row.amount,
            escape_field(&row.measurement_unit)
        );
    }

    out
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(name: &str, amount: i32, unit: &str) -> CartQuantity {
        CartQuantity {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_per_name_in_first_encounter_order() {
        // Recipe1 carries flour and sugar, Recipe2 carries flour again.
        let rows = vec![
            quantity("flour", 200, "g"),
            quantity("sugar", 50, "g"),
            quantity("flour", 100, "g"),
        ];

        let list = aggregate_quantities(rows);
        assert_eq!(
            list,
            vec![
                ShoppingListRow {
                    name: String::from("flour"),
                    amount: 300,
                    measurement_unit: String::from("g"),
                },
                ShoppingListRow {
                    name: String::from("sugar"),
                    amount: 50,
                    measurement_unit: String::from("g"),
                },
            ]
        );
    }

    #[test]
    fn total_ignores_per_recipe_ordering() {
        let forward = vec![
            quantity("milk", 100, "ml"),
            quantity("egg", 2, "pcs"),
            quantity("milk", 250, "ml"),
        ];
        let reversed = vec![
            quantity("milk", 250, "ml"),
            quantity("egg", 2, "pcs"),
            quantity("milk", 100, "ml"),
        ];

        let total = |rows: Vec<CartQuantity>| {
            aggregate_quantities(rows)
                .into_iter()
                .find(|r| r.name == "milk")
                .map(|r| r.amount)
        };

        assert_eq!(total(forward), Some(350));
        assert_eq!(total(reversed), Some(350));
    }

    #[test]
    fn unit_comes_from_first_occurrence() {
        let rows = vec![quantity("butter", 100, "g"), quantity("butter", 1, "pack")];

        let list = aggregate_quantities(rows);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].measurement_unit, "g");
        assert_eq!(list[0].amount, 101);
    }

    #[test]
    fn empty_cart_aggregates_to_nothing() {
        let list = aggregate_quantities(vec![]);
        assert!(list.is_empty());
    }

    #[test]
    fn csv_has_header_and_one_line_per_ingredient() {
        let rows = vec![
            quantity("flour", 200, "g"),
            quantity("sugar", 50, "g"),
            quantity("flour", 100, "g"),
        ];

        let csv = render_csv(&aggregate_quantities(rows));
        assert_eq!(
            csv,
            "Ingredient name,Ingredient amount,Measurement unit\r\n\
             flour,300,g\r\n\
             sugar,50,g\r\n"
        );
    }

    #[test]
    fn csv_quotes_fields_with_separators() {
        let rows = vec![quantity("salt, coarse", 1, "tsp \"heaped\"")];

        let csv = render_csv(&aggregate_quantities(rows));
        assert!(csv.contains("\"salt, coarse\",1,\"tsp \"\"heaped\"\"\""));
    }
}
