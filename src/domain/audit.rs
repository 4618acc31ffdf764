use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    User,
    Transaction,
    Balance,
    Role,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Deposit,
    Withdraw,
    TransferIn,
    TransferOut,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
        };
        f.write_str(name)
    }
}

/// Structured payload describing a balance mutation. Serialized through a
/// stable schema rather than a dynamic map, so readers never do untyped
/// lookups.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BalanceChange {
    pub previous_amount: Decimal,
    pub new_amount: Decimal,
    pub change_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
}

/// An immutable record of a balance-affecting event. Append-only; the latest
/// entry with `created_at <= T` answers "balance as of time T".
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub details: BalanceChange,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Builds an entry for a balance mutation on `user_id`.
    pub fn balance_change(user_id: Uuid, action: AuditAction, details: BalanceChange) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: EntityType::Balance,
            entity_id: user_id,
            action,
            details,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_details_serialize_with_stable_keys() {
        let tx_id = Uuid::new_v4();
        let details = BalanceChange {
            previous_amount: dec!(0.0),
            new_amount: dec!(100.0),
            change_amount: dec!(100.0),
            related_user_id: None,
            transaction_id: Some(tx_id),
        };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["previous_amount"], serde_json::json!("0.0"));
        assert_eq!(json["new_amount"], serde_json::json!("100.0"));
        assert_eq!(json["transaction_id"], serde_json::json!(tx_id));
        // Optional fields are omitted entirely when absent.
        assert!(json.get("related_user_id").is_none());
    }

    #[test]
    fn test_balance_change_entry_targets_balance_entity() {
        let user = Uuid::new_v4();
        let entry = AuditEntry::balance_change(
            user,
            AuditAction::Deposit,
            BalanceChange {
                previous_amount: dec!(0.0),
                new_amount: dec!(5.0),
                change_amount: dec!(5.0),
                related_user_id: None,
                transaction_id: None,
            },
        );

        assert_eq!(entry.entity_type, EntityType::Balance);
        assert_eq!(entry.entity_id, user);
        assert_eq!(entry.action, AuditAction::Deposit);
    }
}
