//! Per-kind form rules: required fields, date ordering, status coupling,
//! alert counters and amount fields.
//!
//! Each kind gets one static [`FormSchema`]; the generic client and server
//! code is parameterized by it instead of duplicating per-kind logic.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;

use crate::entity::{field_str, Fields};
use crate::error::AppError;
use crate::kind::EntityKind;

/// Date format used by every date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A pair of dates where `later` must not precede `earlier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateOrder {
    pub earlier: &'static str,
    pub later: &'static str,
}

/// Status field handling for a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub field: &'static str,
    pub default_value: &'static str,
    /// When set, a non-empty `trigger` field forces the status to `value`.
    pub terminal: Option<TerminalStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalStatus {
    pub trigger: &'static str,
    pub value: &'static str,
}

/// Days-open counter computed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertRule {
    /// Date the counter starts from.
    pub since: &'static str,
    /// Date that stops the counter once filled in.
    pub until: &'static str,
}

/// One amount with the field holding its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountField {
    pub amount: &'static str,
    pub currency: &'static str,
}

/// Field-level rules for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSchema {
    pub kind: EntityKind,
    /// Always mandatory.
    pub primary_date: &'static str,
    /// Other mandatory fields.
    pub required: &'static [&'static str],
    pub date_order: &'static [DateOrder],
    pub status: Option<StatusRule>,
    pub alert: Option<AlertRule>,
    pub amounts: &'static [AmountField],
    /// Legacy kinds hold at most one document.
    pub single_document: bool,
}

const AMOUNT: AmountField = AmountField {
    amount: "amount",
    currency: "currency",
};

static APPEAL: FormSchema = FormSchema {
    kind: EntityKind::Appeal,
    primary_date: "filingDate",
    required: &[],
    date_order: &[DateOrder {
        earlier: "filingDate",
        later: "responseDate",
    }],
    status: Some(StatusRule {
        field: "status",
        default_value: "open",
        terminal: Some(TerminalStatus {
            trigger: "responseDate",
            value: "closed",
        }),
    }),
    alert: Some(AlertRule {
        since: "filingDate",
        until: "responseDate",
    }),
    amounts: &[AMOUNT],
    single_document: false,
};

static DECISION: FormSchema = FormSchema {
    kind: EntityKind::Decision,
    primary_date: "decisionDate",
    required: &[],
    date_order: &[DateOrder {
        earlier: "decisionDate",
        later: "paymentDate",
    }],
    status: Some(StatusRule {
        field: "status",
        default_value: "pending",
        terminal: None,
    }),
    alert: None,
    amounts: &[AMOUNT],
    single_document: false,
};

static RECOURSE: FormSchema = FormSchema {
    kind: EntityKind::Recourse,
    primary_date: "filingDate",
    required: &[],
    date_order: &[DateOrder {
        earlier: "filingDate",
        later: "judgmentDate",
    }],
    status: Some(StatusRule {
        field: "status",
        default_value: "open",
        terminal: None,
    }),
    alert: None,
    amounts: &[
        AmountField {
            amount: "claimAmount",
            currency: "currency",
        },
        AmountField {
            amount: "recoveredAmount",
            currency: "currency",
        },
    ],
    single_document: false,
};

static SETTLEMENT: FormSchema = FormSchema {
    kind: EntityKind::Settlement,
    primary_date: "settlementDate",
    required: &[],
    date_order: &[DateOrder {
        earlier: "settlementDate",
        later: "paymentDate",
    }],
    status: Some(StatusRule {
        field: "status",
        default_value: "pending",
        terminal: None,
    }),
    alert: None,
    amounts: &[AMOUNT],
    single_document: false,
};

static CLIENT_CLAIM: FormSchema = FormSchema {
    kind: EntityKind::ClientClaim,
    primary_date: "receivedDate",
    required: &[],
    date_order: &[DateOrder {
        earlier: "receivedDate",
        later: "decisionDate",
    }],
    status: Some(StatusRule {
        field: "status",
        default_value: "open",
        terminal: None,
    }),
    alert: None,
    amounts: &[
        AmountField {
            amount: "claimedAmount",
            currency: "currency",
        },
        AmountField {
            amount: "paidAmount",
            currency: "currency",
        },
    ],
    single_document: true,
};

impl EntityKind {
    pub fn schema(&self) -> &'static FormSchema {
        match self {
            EntityKind::Appeal => &APPEAL,
            EntityKind::Decision => &DECISION,
            EntityKind::Recourse => &RECOURSE,
            EntityKind::Settlement => &SETTLEMENT,
            EntityKind::ClientClaim => &CLIENT_CLAIM,
        }
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

impl FormSchema {
    /// Initial field values for a new draft.
    pub fn defaults(&self, today: NaiveDate) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            self.primary_date.to_string(),
            Value::String(today.format(DATE_FORMAT).to_string()),
        );
        if let Some(status) = &self.status {
            fields.insert(
                status.field.to_string(),
                Value::String(status.default_value.to_string()),
            );
        }
        fields
    }

    /// Check required fields and date ordering.
    ///
    /// Returns a `ValidationError` whose `field_errors` names every offending
    /// field.
    pub fn validate(&self, fields: &Fields) -> Result<(), AppError> {
        let mut errors: HashMap<String, String> = HashMap::new();
        let date_names: Vec<&str> = std::iter::once(self.primary_date)
            .chain(self.date_order.iter().flat_map(|o| [o.earlier, o.later]))
            .collect();

        for name in std::iter::once(&self.primary_date).chain(self.required.iter()) {
            if is_blank(fields, name) {
                errors.insert(name.to_string(), "This field is required".to_string());
            }
        }

        let mut dates: HashMap<&str, NaiveDate> = HashMap::new();
        for name in date_names {
            if dates.contains_key(name) || errors.contains_key(name) || is_blank(fields, name) {
                continue;
            }
            match field_str(fields, name).and_then(parse_date) {
                Some(date) => {
                    dates.insert(name, date);
                }
                None => {
                    errors.insert(
                        name.to_string(),
                        "Expected a date in YYYY-MM-DD format".to_string(),
                    );
                }
            }
        }

        for order in self.date_order {
            if let (Some(earlier), Some(later)) = (dates.get(order.earlier), dates.get(order.later)) {
                if later < earlier {
                    errors.insert(
                        order.later.to_string(),
                        format!("Must not be earlier than {}", order.earlier),
                    );
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(
                format!("Invalid {} form", self.kind.label()),
                errors,
            ))
        }
    }

    /// Force the terminal status when its trigger date is filled in.
    ///
    /// Kinds without a terminal rule are left untouched.
    pub fn apply_status_rule(&self, fields: &mut Fields) {
        let Some(status) = &self.status else { return };
        let Some(terminal) = &status.terminal else { return };
        if field_str(fields, terminal.trigger).is_some() {
            fields.insert(
                status.field.to_string(),
                Value::String(terminal.value.to_string()),
            );
        }
    }

    /// Days elapsed since the alert start date, while the stop date is empty.
    ///
    /// `None` for kinds without an alert rule, for closed entities and for an
    /// unparseable start date.
    pub fn alert_days(&self, fields: &Fields, today: NaiveDate) -> Option<i64> {
        let rule = self.alert.as_ref()?;
        if field_str(fields, rule.until).is_some() {
            return None;
        }
        let since = parse_date(field_str(fields, rule.since)?)?;
        Some((today - since).num_days())
    }
}

/// Missing, null and whitespace-only values count as not filled in.
fn is_blank(fields: &Fields, name: &str) -> bool {
    match fields.get(name) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
