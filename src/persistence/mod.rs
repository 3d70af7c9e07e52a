//! Persistence layer: referral bookkeeping.
//!
//! Provides the [`ReferralStore`] trait for users, referrals and referral
//! payments. [`postgres::PostgresReferralStore`] uses `sqlx::PgPool` with
//! embedded migrations; [`memory::InMemoryReferralStore`] backs tests and
//! deployments without a database.
//!
//! Every method is a single statement. Counter updates are last-write-wins.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use memory::InMemoryReferralStore;
pub use models::{
    NewReferral, NewReferralPayment, ReferralPaymentRow, ReferralRow, ReferralStatus,
    ReferredUser, UserRow,
};
pub use postgres::PostgresReferralStore;

use crate::error::GatewayError;

/// Storage for referral users, referrals and payments.
#[async_trait]
pub trait ReferralStore: std::fmt::Debug + Send + Sync {
    /// Inserts the user or refreshes its referral code, returning the row.
    async fn upsert_user(&self, address: &str, referral_code: &str)
    -> Result<UserRow, GatewayError>;

    /// Looks a user up by address.
    async fn get_user(&self, address: &str) -> Result<Option<UserRow>, GatewayError>;

    /// Looks a user up by referral code. The oldest match wins.
    async fn get_user_by_code(&self, code: &str) -> Result<Option<UserRow>, GatewayError>;

    /// Records a referral.
    ///
    /// Returns [`GatewayError::Conflict`] if the referee already has one.
    async fn insert_referral(&self, referral: NewReferral) -> Result<ReferralRow, GatewayError>;

    /// The referral recorded for `referee`, if any.
    async fn get_referral(&self, referee: &str) -> Result<Option<ReferralRow>, GatewayError>;

    /// Sets the referrer's referral counter.
    async fn set_total_referrals(&self, address: &str, total: i64) -> Result<(), GatewayError>;

    /// Sets the referrer's earnings total.
    async fn set_total_earnings(&self, address: &str, total: f64) -> Result<(), GatewayError>;

    /// Records a bonus payment.
    async fn insert_payment(
        &self,
        payment: NewReferralPayment,
    ) -> Result<ReferralPaymentRow, GatewayError>;

    /// Wallets referred by `referrer`, newest first.
    async fn referred_users(&self, referrer: &str) -> Result<Vec<ReferredUser>, GatewayError>;
}
