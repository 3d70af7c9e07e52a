//! PostgreSQL implementation of the referral store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::ReferralStore;
use super::models::{
    NewReferral, NewReferralPayment, ReferralPaymentRow, ReferralRow, ReferredUser, UserRow,
};
use crate::config::GatewayConfig;
use crate::error::GatewayError;

type UserTuple = (i64, String, String, i64, f64, DateTime<Utc>, DateTime<Utc>);
type ReferralTuple = (i64, String, String, String, String, f64, DateTime<Utc>);

const USER_COLUMNS: &str =
    "id, address, referral_code, total_referrals, total_earnings, created_at, updated_at";
const REFERRAL_COLUMNS: &str =
    "id, referee_address, referrer_address, referrer_code, status, bonus_amount, created_at";

fn user_from_tuple(
    (id, address, referral_code, total_referrals, total_earnings, created_at, updated_at): UserTuple,
) -> UserRow {
    UserRow {
        id,
        address,
        referral_code,
        total_referrals,
        total_earnings,
        created_at,
        updated_at,
    }
}

fn referral_from_tuple(
    (id, referee_address, referrer_address, referrer_code, status, bonus_amount, created_at): ReferralTuple,
) -> Result<ReferralRow, GatewayError> {
    Ok(ReferralRow {
        id,
        referee_address,
        referrer_address,
        referrer_code,
        status: status.parse()?,
        bonus_amount,
        created_at,
    })
}

fn db_err(e: sqlx::Error) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

/// PostgreSQL-backed referral store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresReferralStore {
    pool: PgPool,
}

impl PostgresReferralStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool sized by `DATABASE_*` settings.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if no connection can
    /// be established.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .map_err(db_err)?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }
}

#[async_trait]
impl ReferralStore for PostgresReferralStore {
    async fn upsert_user(
        &self,
        address: &str,
        referral_code: &str,
    ) -> Result<UserRow, GatewayError> {
        let row = sqlx::query_as::<_, UserTuple>(&format!(
            "INSERT INTO users (address, referral_code) VALUES ($1, $2) \
             ON CONFLICT (address) DO UPDATE SET referral_code = EXCLUDED.referral_code, updated_at = now() \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(address)
        .bind(referral_code)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(user_from_tuple(row))
    }

    async fn get_user(&self, address: &str) -> Result<Option<UserRow>, GatewayError> {
        let row = sqlx::query_as::<_, UserTuple>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE address = $1"
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(user_from_tuple))
    }

    async fn get_user_by_code(&self, code: &str) -> Result<Option<UserRow>, GatewayError> {
        let row = sqlx::query_as::<_, UserTuple>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE referral_code = $1 ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(user_from_tuple))
    }

    async fn insert_referral(&self, referral: NewReferral) -> Result<ReferralRow, GatewayError> {
        let row = sqlx::query_as::<_, ReferralTuple>(&format!(
            "INSERT INTO referrals (referee_address, referrer_address, referrer_code, status) \
             VALUES ($1, $2, $3, $4) RETURNING {REFERRAL_COLUMNS}"
        ))
        .bind(&referral.referee_address)
        .bind(&referral.referrer_address)
        .bind(&referral.referrer_code)
        .bind(referral.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => GatewayError::Conflict(
                format!("{} already has a referral", referral.referee_address),
            ),
            other => db_err(other),
        })?;
        referral_from_tuple(row)
    }

    async fn get_referral(&self, referee: &str) -> Result<Option<ReferralRow>, GatewayError> {
        let row = sqlx::query_as::<_, ReferralTuple>(&format!(
            "SELECT {REFERRAL_COLUMNS} FROM referrals WHERE referee_address = $1"
        ))
        .bind(referee)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(referral_from_tuple).transpose()
    }

    async fn set_total_referrals(&self, address: &str, total: i64) -> Result<(), GatewayError> {
        sqlx::query("UPDATE users SET total_referrals = $2, updated_at = now() WHERE address = $1")
            .bind(address)
            .bind(total)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_total_earnings(&self, address: &str, total: f64) -> Result<(), GatewayError> {
        sqlx::query("UPDATE users SET total_earnings = $2, updated_at = now() WHERE address = $1")
            .bind(address)
            .bind(total)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn insert_payment(
        &self,
        payment: NewReferralPayment,
    ) -> Result<ReferralPaymentRow, GatewayError> {
        let (id, paid_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO referral_payments \
             (referrer_address, referee_address, prompt_submission_id, bonus_amount, transaction_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id, paid_at",
        )
        .bind(&payment.referrer_address)
        .bind(&payment.referee_address)
        .bind(&payment.prompt_submission_id)
        .bind(payment.bonus_amount)
        .bind(&payment.transaction_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(ReferralPaymentRow {
            id,
            referrer_address: payment.referrer_address,
            referee_address: payment.referee_address,
            prompt_submission_id: payment.prompt_submission_id,
            bonus_amount: payment.bonus_amount,
            transaction_hash: payment.transaction_hash,
            paid_at,
        })
    }

    async fn referred_users(&self, referrer: &str) -> Result<Vec<ReferredUser>, GatewayError> {
        let rows = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT referee_address, created_at FROM referrals \
             WHERE referrer_address = $1 ORDER BY created_at DESC",
        )
        .bind(referrer)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(referee_address, created_at)| ReferredUser {
                referee_address,
                created_at,
            })
            .collect())
    }
}
