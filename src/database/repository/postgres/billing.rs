use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use crate::database::models::{PaymentDetails, StripeCard, StripePaymentToken};
use crate::database::repository::{BillingRepo, RepoError, RepoResult};

const COLUMNS: &str = "id, created, created_by, updated, updated_by, token_created, token_id, \
    token_type, token_client_ip, token_used, token_live_mode, card";

#[derive(FromRow)]
struct PaymentRow {
    id: i64,
    created: DateTime<Utc>,
    created_by: i64,
    updated: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    token_created: i64,
    token_id: String,
    token_type: String,
    token_client_ip: String,
    token_used: bool,
    token_live_mode: bool,
    card: Json<StripeCard>,
}

impl From<PaymentRow> for PaymentDetails {
    fn from(row: PaymentRow) -> Self {
        PaymentDetails {
            id: row.id,
            created: row.created,
            created_by: row.created_by,
            updated: row.updated,
            updated_by: row.updated_by,
            token: StripePaymentToken {
                created: row.token_created,
                id: row.token_id,
                token_type: row.token_type,
                client_ip: row.token_client_ip,
                used: row.token_used,
                livemode: row.token_live_mode,
                card: row.card.0,
            },
        }
    }
}

pub struct PgBillingRepo {
    pool: PgPool,
}

impl PgBillingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_SQL: &str = "INSERT INTO payment_detail (created, created_by, token_created, token_id, \
    token_type, token_client_ip, token_used, token_live_mode, card) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id";

const UPDATE_SQL: &str = "UPDATE payment_detail SET updated = $1, updated_by = $2, token_created = $3, \
    token_id = $4, token_type = $5, token_client_ip = $6, token_used = $7, token_live_mode = $8, \
    card = $9 WHERE id = $10";

#[async_trait]
impl BillingRepo for PgBillingRepo {
    async fn list(&self) -> RepoResult<Vec<PaymentDetails>> {
        let sql = format!("SELECT {} FROM payment_detail ORDER BY id", COLUMNS);
        let rows = sqlx::query_as::<_, PaymentRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PaymentDetails::from).collect())
    }

    async fn find_by_created_by_id(&self, user_id: i64) -> RepoResult<Option<PaymentDetails>> {
        let sql = format!("SELECT {} FROM payment_detail WHERE created_by = $1", COLUMNS);
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PaymentDetails::from))
    }

    async fn save(&self, d: &PaymentDetails) -> RepoResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(INSERT_SQL)
            .bind(d.created)
            .bind(d.created_by)
            .bind(d.token.created)
            .bind(&d.token.id)
            .bind(&d.token.token_type)
            .bind(&d.token.client_ip)
            .bind(d.token.used)
            .bind(d.token.livemode)
            .bind(Json(&d.token.card))
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, d: &PaymentDetails) -> RepoResult<()> {
        let result = sqlx::query(UPDATE_SQL)
            .bind(d.updated)
            .bind(d.updated_by)
            .bind(d.token.created)
            .bind(&d.token.id)
            .bind(&d.token.token_type)
            .bind(&d.token.client_ip)
            .bind(d.token.used)
            .bind(d.token.livemode)
            .bind(Json(&d.token.card))
            .bind(d.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NoRowsAffected {
                entity: "payment_detail",
                id: d.id,
            });
        }
        Ok(())
    }

    async fn save_or_update(&self, mut details: PaymentDetails, actor_id: i64) -> RepoResult<PaymentDetails> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Row lock keeps two concurrent submissions from both inserting
        let existing: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, created FROM payment_detail WHERE created_by = $1 FOR UPDATE")
                .bind(actor_id)
                .fetch_optional(&mut *tx)
                .await?;

        details.created_by = actor_id;
        match existing {
            Some((id, created)) => {
                details.id = id;
                details.created = created;
                details.updated = Some(now);
                details.updated_by = Some(actor_id);
                let result = sqlx::query(UPDATE_SQL)
                    .bind(details.updated)
                    .bind(details.updated_by)
                    .bind(details.token.created)
                    .bind(&details.token.id)
                    .bind(&details.token.token_type)
                    .bind(&details.token.client_ip)
                    .bind(details.token.used)
                    .bind(details.token.livemode)
                    .bind(Json(&details.token.card))
                    .bind(details.id)
                    .execute(&mut *tx)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(RepoError::NoRowsAffected { entity: "payment_detail", id });
                }
            }
            None => {
                details.created = now;
                details.updated = None;
                details.updated_by = None;
                details.id = sqlx::query_scalar::<_, i64>(INSERT_SQL)
                    .bind(details.created)
                    .bind(details.created_by)
                    .bind(details.token.created)
                    .bind(&details.token.id)
                    .bind(&details.token.token_type)
                    .bind(&details.token.client_ip)
                    .bind(details.token.used)
                    .bind(details.token.livemode)
                    .bind(Json(&details.token.card))
                    .fetch_one(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(details)
    }
}
