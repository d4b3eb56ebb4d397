//! Audit trail models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::invoice::format_receipt_timestamp;

/// One append-only audit entry.
///
/// `email` and `fullname` are copies taken when the entry was written, so the
/// entry survives the user being renamed or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserActivity {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub fullname: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// A mutation worth recording in the audit trail.
///
/// Events are published after the mutating transaction commits. Deletion
/// events carry the acting user's email because their action text names the
/// actor.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    GroupAdded { name: String },
    GroupUpdated { old_name: String, new_name: String },
    GroupDeleted { actor_email: String, name: String },
    ItemAdded { code: String },
    ItemUpdated { code: String },
    ItemDeleted { actor_email: String, code: String },
    ShopAdded { name: String },
    ShopUpdated { old_name: String, new_name: String },
    ShopDeleted { actor_email: String, name: String },
    InvoiceRecorded { created_at: DateTime<Utc> },
    InvoiceDeleted { actor_email: String, invoice_id: i64 },
    UserCreated,
    LoggedIn,
    PasswordUpdated,
}

impl AuditEvent {
    /// Free-text action stored in the audit entry
    pub fn action(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::GroupAdded { name } => write!(f, "Added group '{}'", name),
            AuditEvent::GroupUpdated { old_name, new_name } => {
                write!(f, "Updated group '{}' to '{}'", old_name, new_name)
            }
            AuditEvent::GroupDeleted { actor_email, name } => {
                write!(f, "{} deleted group '{}'", actor_email, name)
            }
            AuditEvent::ItemAdded { code } => write!(f, "added product code - {}", code),
            AuditEvent::ItemUpdated { code } => write!(f, "updated product code - {}", code),
            AuditEvent::ItemDeleted { actor_email, code } => {
                write!(f, "{} deleted product '{}'", actor_email, code)
            }
            AuditEvent::ShopAdded { name } => write!(f, "Added shop '{}'", name),
            AuditEvent::ShopUpdated { old_name, new_name } => {
                write!(f, "Updated shop '{}' to '{}'", old_name, new_name)
            }
            AuditEvent::ShopDeleted { actor_email, name } => {
                write!(f, "{} deleted shop '{}'", actor_email, name)
            }
            AuditEvent::InvoiceRecorded { created_at } => {
                write!(f, "receipt issued at {}", format_receipt_timestamp(*created_at))
            }
            AuditEvent::InvoiceDeleted { actor_email, invoice_id } => {
                write!(f, "{} deleted receipt {}", actor_email, invoice_id)
            }
            AuditEvent::UserCreated => f.write_str("created new user"),
            AuditEvent::LoggedIn => f.write_str("logged in"),
            AuditEvent::PasswordUpdated => f.write_str("updated password"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_group_actions() {
        let added = AuditEvent::GroupAdded { name: "Drinks".into() };
        assert_eq!(added.action(), "Added group 'Drinks'");

        let updated = AuditEvent::GroupUpdated {
            old_name: "Drinks".into(),
            new_name: "Beverages".into(),
        };
        assert_eq!(updated.action(), "Updated group 'Drinks' to 'Beverages'");

        let deleted = AuditEvent::GroupDeleted {
            actor_email: "ann@example.com".into(),
            name: "Beverages".into(),
        };
        assert_eq!(deleted.action(), "ann@example.com deleted group 'Beverages'");
    }

    #[test]
    fn test_item_actions() {
        let code = "SARA000007".to_string();
        assert_eq!(
            AuditEvent::ItemAdded { code: code.clone() }.action(),
            "added product code - SARA000007"
        );
        assert_eq!(
            AuditEvent::ItemUpdated { code: code.clone() }.action(),
            "updated product code - SARA000007"
        );
        assert_eq!(
            AuditEvent::ItemDeleted { actor_email: "bo@example.com".into(), code }.action(),
            "bo@example.com deleted product 'SARA000007'"
        );
    }

    #[test]
    fn test_invoice_actions() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 9, 5, 0).unwrap();
        assert_eq!(
            AuditEvent::InvoiceRecorded { created_at: at }.action(),
            "receipt issued at 31/12/2024 0905"
        );
        assert_eq!(
            AuditEvent::InvoiceDeleted { actor_email: "a@b.co".into(), invoice_id: 12 }.action(),
            "a@b.co deleted receipt 12"
        );
    }

    #[test]
    fn test_user_actions() {
        assert_eq!(AuditEvent::UserCreated.action(), "created new user");
        assert_eq!(AuditEvent::LoggedIn.action(), "logged in");
        assert_eq!(AuditEvent::PasswordUpdated.action(), "updated password");
    }
}
