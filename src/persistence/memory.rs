//! In-memory referral store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::ReferralStore;
use super::models::{
    NewReferral, NewReferralPayment, ReferralPaymentRow, ReferralRow, ReferredUser, UserRow,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, UserRow>,
    referrals: HashMap<String, ReferralRow>,
    payments: Vec<ReferralPaymentRow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Referral store held in process memory. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryReferralStore {
    tables: RwLock<Tables>,
}

impl InMemoryReferralStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferralStore for InMemoryReferralStore {
    async fn upsert_user(
        &self,
        address: &str,
        referral_code: &str,
    ) -> Result<UserRow, GatewayError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        if let Some(user) = tables.users.get_mut(address) {
            user.referral_code = referral_code.to_string();
            user.updated_at = now;
            return Ok(user.clone());
        }
        let id = tables.next_id();
        let user = UserRow {
            id,
            address: address.to_string(),
            referral_code: referral_code.to_string(),
            total_referrals: 0,
            total_earnings: 0.0,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(address.to_string(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, address: &str) -> Result<Option<UserRow>, GatewayError> {
        Ok(self.tables.read().await.users.get(address).cloned())
    }

    async fn get_user_by_code(&self, code: &str) -> Result<Option<UserRow>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.referral_code == code)
            .min_by_key(|u| (u.created_at, u.id))
            .cloned())
    }

    async fn insert_referral(&self, referral: NewReferral) -> Result<ReferralRow, GatewayError> {
        let mut tables = self.tables.write().await;
        if tables.referrals.contains_key(&referral.referee_address) {
            return Err(GatewayError::Conflict(format!(
                "{} already has a referral",
                referral.referee_address
            )));
        }
        let id = tables.next_id();
        let row = ReferralRow {
            id,
            referee_address: referral.referee_address,
            referrer_address: referral.referrer_address,
            referrer_code: referral.referrer_code,
            status: referral.status,
            bonus_amount: 0.0,
            created_at: Utc::now(),
        };
        tables
            .referrals
            .insert(row.referee_address.clone(), row.clone());
        Ok(row)
    }

    async fn get_referral(&self, referee: &str) -> Result<Option<ReferralRow>, GatewayError> {
        Ok(self.tables.read().await.referrals.get(referee).cloned())
    }

    async fn set_total_referrals(&self, address: &str, total: i64) -> Result<(), GatewayError> {
        if let Some(user) = self.tables.write().await.users.get_mut(address) {
            user.total_referrals = total;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_total_earnings(&self, address: &str, total: f64) -> Result<(), GatewayError> {
        if let Some(user) = self.tables.write().await.users.get_mut(address) {
            user.total_earnings = total;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_payment(
        &self,
        payment: NewReferralPayment,
    ) -> Result<ReferralPaymentRow, GatewayError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let row = ReferralPaymentRow {
            id,
            referrer_address: payment.referrer_address,
            referee_address: payment.referee_address,
            prompt_submission_id: payment.prompt_submission_id,
            bonus_amount: payment.bonus_amount,
            transaction_hash: payment.transaction_hash,
            paid_at: Utc::now(),
        };
        tables.payments.push(row.clone());
        Ok(row)
    }

    async fn referred_users(&self, referrer: &str) -> Result<Vec<ReferredUser>, GatewayError> {
        let tables = self.tables.read().await;
        let mut users: Vec<(i64, ReferredUser)> = tables
            .referrals
            .values()
            .filter(|r| r.referrer_address == referrer)
            .map(|r| {
                (
                    r.id,
                    ReferredUser {
                        referee_address: r.referee_address.clone(),
                        created_at: r.created_at,
                    },
                )
            })
            .collect();
        users.sort_by(|(a_id, a), (b_id, b)| {
            b.created_at.cmp(&a.created_at).then(b_id.cmp(a_id))
        });
        Ok(users.into_iter().map(|(_, u)| u).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::ReferralStatus;

    fn referral(referee: &str, referrer: &str) -> NewReferral {
        NewReferral {
            referee_address: referee.to_string(),
            referrer_address: referrer.to_string(),
            referrer_code: "ABCDEF".to_string(),
            status: ReferralStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_counters() {
        let store = InMemoryReferralStore::new();
        let first = store.upsert_user("0xabc", "ABC").await;
        assert!(first.is_ok());
        let _ = store.set_total_referrals("0xabc", 4).await;
        let again = store.upsert_user("0xabc", "ABC").await;
        assert!(again.is_ok_and(|u| u.total_referrals == 4));
    }

    #[tokio::test]
    async fn second_referral_for_same_referee_conflicts() {
        let store = InMemoryReferralStore::new();
        assert!(store.insert_referral(referral("0x1", "0x9")).await.is_ok());
        assert!(matches!(
            store.insert_referral(referral("0x1", "0x8")).await,
            Err(GatewayError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn referred_users_newest_first() {
        let store = InMemoryReferralStore::new();
        let _ = store.insert_referral(referral("0x1", "0x9")).await;
        let _ = store.insert_referral(referral("0x2", "0x9")).await;
        let _ = store.insert_referral(referral("0x3", "0x8")).await;

        let users = store.referred_users("0x9").await.unwrap_or_default();
        let order: Vec<_> = users.iter().map(|u| u.referee_address.as_str()).collect();
        assert_eq!(order, vec!["0x2", "0x1"]);
    }
}
