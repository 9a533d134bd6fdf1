use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::person::PersonRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Everyone who reviews justifications
    Admins,
    Person(PersonRef),
}

/// Outbound notifications. Delivery is best effort: callers log failures and
/// carry on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, recipient: Recipient, message: String) -> anyhow::Result<()>;
}

/// Queues notifications in the `notifications` table, which the messaging
/// service drains.
pub struct MySqlNotificationSink {
    pool: MySqlPool,
}

impl MySqlNotificationSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for MySqlNotificationSink {
    async fn notify(&self, recipient: Recipient, message: String) -> anyhow::Result<()> {
        let (audience, kind, person_id) = match recipient {
            Recipient::Admins => ("ADMINS", None, None),
            Recipient::Person(p) => ("PERSON", Some(p.kind.to_string()), Some(p.id)),
        };

        sqlx::query(
            r#"
            INSERT INTO notifications (audience, person_kind, person_id, message, created_at)
            VALUES (?, ?, ?, ?, UTC_TIMESTAMP(3))
            "#,
        )
        .bind(audience)
        .bind(kind)
        .bind(person_id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
