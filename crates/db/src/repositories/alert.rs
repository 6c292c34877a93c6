use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use sentinel_core::domain::alert::{AlertId, FlightAlert};
use sentinel_core::domain::identity::UserId;

use super::{format_timestamp, parse_timestamp, AlertRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAlertRepository {
    pool: DbPool,
}

impl SqlAlertRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_alert(row: &sqlx::sqlite::SqliteRow) -> Result<FlightAlert, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let origin: String =
        row.try_get("origin").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let destination: String =
        row.try_get("destination").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let dates: String = row.try_get("dates").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let target_price: String =
        row.try_get("target_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: Option<String> =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let target_price = Decimal::from_str(&target_price)
        .map_err(|e| RepositoryError::Decode(format!("invalid `target_price`: {e}")))?;

    Ok(FlightAlert {
        id: AlertId(id),
        user_id: UserId(user_id),
        origin,
        destination,
        dates,
        target_price,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: updated_at.as_deref().map(|s| parse_timestamp("updated_at", s)).transpose()?,
    })
}

#[async_trait::async_trait]
impl AlertRepository for SqlAlertRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<FlightAlert>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, user_id, origin, destination, dates, target_price, created_at, updated_at
             FROM flight_alerts
             WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_alert).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &AlertId) -> Result<Option<FlightAlert>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, origin, destination, dates, target_price, created_at, updated_at
             FROM flight_alerts WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_alert).transpose()
    }

    async fn create(&self, alert: FlightAlert) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO flight_alerts
                 (id, user_id, origin, destination, dates, target_price, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&alert.id.0)
        .bind(&alert.user_id.0)
        .bind(&alert.origin)
        .bind(&alert.destination)
        .bind(&alert.dates)
        .bind(alert.target_price.to_string())
        .bind(format_timestamp(&alert.created_at))
        .bind(alert.updated_at.as_ref().map(format_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, alert: FlightAlert) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE flight_alerts
             SET origin = ?, destination = ?, dates = ?, target_price = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&alert.origin)
        .bind(&alert.destination)
        .bind(&alert.dates)
        .bind(alert.target_price.to_string())
        .bind(alert.updated_at.as_ref().map(format_timestamp))
        .bind(&alert.id.0)
        .bind(&alert.user_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user_id: &UserId, id: &AlertId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM flight_alerts WHERE id = ? AND user_id = ?")
            .bind(&id.0)
            .bind(&user_id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
