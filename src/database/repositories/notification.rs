use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::utils::sql;
use crate::error::AppError;
use crate::services::ports::NotificationSink;

/// Writes bell notifications and inbox messages as rows for the client apps to poll
#[derive(Clone)]
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn notify(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        message: &str,
    ) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            INSERT INTO
                notifications (id, user_id, request_id, message, is_read, created_at)
            VALUES
                (?, ?, ?, ?, FALSE, ?)
        "#))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request_id)
        .bind(message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn send_message(
        &self,
        user_id: Uuid,
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            INSERT INTO
                inbox_messages (id, user_id, subject, body, is_read, created_at)
            VALUES
                (?, ?, ?, ?, FALSE, ?)
        "#))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(subject)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
