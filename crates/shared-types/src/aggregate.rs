use serde_json::Value;
use std::collections::BTreeMap;

use crate::entity::{field_str, Entity, Fields};
use crate::schema::AmountField;

/// Sums keyed by currency code.
pub type CurrencyTotals = BTreeMap<String, f64>;

/// Read an amount that may be a JSON number or a numeric string.
///
/// Strings may use spaces as thousands separators and a comma as the
/// decimal separator (`"1 234,50"`). Anything unreadable yields `None`.
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
        _ => None,
    }
}

fn add_field(totals: &mut CurrencyTotals, fields: &Fields, field: &AmountField, default_currency: &str) {
    let amount = fields.get(field.amount).and_then(parse_amount).unwrap_or(0.0);
    let currency = field_str(fields, field.currency)
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| default_currency.to_string());
    *totals.entry(currency).or_insert(0.0) += amount;
}

/// Per-currency sum of one entity's own amount fields.
pub fn entity_totals(entity: &Entity, amounts: &[AmountField], default_currency: &str) -> CurrencyTotals {
    let mut totals = CurrencyTotals::new();
    for field in amounts {
        add_field(&mut totals, &entity.fields, field, default_currency);
    }
    totals
}

/// Per-currency sum over a list of entities.
///
/// Always recomputed from the list it is given; callers never store the
/// result next to the list.
pub fn totals_by_currency<'a, I>(entities: I, amounts: &[AmountField], default_currency: &str) -> CurrencyTotals
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut totals = CurrencyTotals::new();
    for entity in entities {
        for field in amounts {
            add_field(&mut totals, &entity.fields, field, default_currency);
        }
    }
    totals
}
