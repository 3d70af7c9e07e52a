//! Referral bookkeeping: users, referral codes, referrals and bonuses.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::WalletAddress;
use crate::error::GatewayError;
use crate::persistence::{
    NewReferral, NewReferralPayment, ReferralPaymentRow, ReferralRow, ReferralStatus,
    ReferralStore, ReferredUser, UserRow,
};

/// A referrer's summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReferralStats {
    /// The user's own referral code.
    pub referral_code: String,
    /// Users referred.
    pub total_referrals: i64,
    /// Bonuses earned.
    pub total_earnings: f64,
    /// Referred wallets, newest first.
    pub referred_users: Vec<ReferredUser>,
}

/// Why a referral was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferralRejection {
    /// No user has this code.
    UnknownCode,
    /// The code belongs to the referee.
    SelfReferral,
    /// The referee was already referred.
    AlreadyReferred,
}

/// Outcome of [`ReferralService::track_referral`].
pub type TrackOutcome = Result<ReferralRow, ReferralRejection>;

/// Referral operations over a [`ReferralStore`].
#[derive(Debug, Clone)]
pub struct ReferralService {
    store: Arc<dyn ReferralStore>,
}

impl ReferralService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ReferralStore>) -> Self {
        Self { store }
    }

    /// Creates the user, or refreshes its code if it exists.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on store failure.
    pub async fn create_user(&self, address: &WalletAddress) -> Result<UserRow, GatewayError> {
        let user = self
            .store
            .upsert_user(address.as_str(), &address.referral_code())
            .await?;
        tracing::debug!(%address, code = %user.referral_code, "referral user upserted");
        Ok(user)
    }

    /// Looks a user up by address.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the user does not exist.
    pub async fn get_user(&self, address: &WalletAddress) -> Result<UserRow, GatewayError> {
        self.store
            .get_user(address.as_str())
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("user {address}")))
    }

    /// Looks a user up by referral code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no user has the code.
    pub async fn get_user_by_referral_code(&self, code: &str) -> Result<UserRow, GatewayError> {
        let code = normalize_code(code);
        self.store
            .get_user_by_code(&code)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("referral code {code}")))
    }

    /// Records that `referee` signed up with `code` and bumps the
    /// referrer's counter.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on store failure.
    /// Business rejections come back as `Ok(Err(_))`.
    pub async fn track_referral(
        &self,
        referee: &WalletAddress,
        code: &str,
    ) -> Result<TrackOutcome, GatewayError> {
        let code = normalize_code(code);
        let Some(referrer) = self.store.get_user_by_code(&code).await? else {
            tracing::warn!(%referee, %code, "invalid referral code");
            return Ok(Err(ReferralRejection::UnknownCode));
        };
        if referrer.address == referee.as_str() {
            tracing::warn!(%referee, "self-referral rejected");
            return Ok(Err(ReferralRejection::SelfReferral));
        }

        let referral = match self
            .store
            .insert_referral(NewReferral {
                referee_address: referee.as_str().to_string(),
                referrer_address: referrer.address.clone(),
                referrer_code: code,
                status: ReferralStatus::Confirmed,
            })
            .await
        {
            Ok(row) => row,
            Err(GatewayError::Conflict(_)) => {
                tracing::warn!(%referee, "referee already referred");
                return Ok(Err(ReferralRejection::AlreadyReferred));
            }
            Err(e) => return Err(e),
        };

        self.store
            .set_total_referrals(&referrer.address, referrer.total_referrals + 1)
            .await?;
        tracing::info!(%referee, referrer = %referrer.address, "referral tracked");
        Ok(Ok(referral))
    }

    /// The referral recorded for `referee`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the wallet was not referred.
    pub async fn get_referral_info(
        &self,
        referee: &WalletAddress,
    ) -> Result<ReferralRow, GatewayError> {
        self.store
            .get_referral(referee.as_str())
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("referral for {referee}")))
    }

    /// Records a bonus for the referrer of `referee` and adds it to the
    /// referrer's earnings. Returns `None` when the wallet was not referred.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a negative or
    /// non-finite amount, or a store failure.
    pub async fn pay_referral_bonus(
        &self,
        referee: &WalletAddress,
        prompt_submission_id: &str,
        bonus_amount: f64,
        transaction_hash: Option<String>,
    ) -> Result<Option<ReferralPaymentRow>, GatewayError> {
        if !bonus_amount.is_finite() || bonus_amount < 0.0 {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid bonus amount: {bonus_amount}"
            )));
        }
        let Some(referral) = self.store.get_referral(referee.as_str()).await? else {
            return Ok(None);
        };

        let payment = self
            .store
            .insert_payment(NewReferralPayment {
                referrer_address: referral.referrer_address.clone(),
                referee_address: referee.as_str().to_string(),
                prompt_submission_id: prompt_submission_id.to_string(),
                bonus_amount,
                transaction_hash,
            })
            .await?;

        if let Some(referrer) = self.store.get_user(&referral.referrer_address).await? {
            self.store
                .set_total_earnings(&referrer.address, referrer.total_earnings + bonus_amount)
                .await?;
        }
        tracing::info!(%referee, referrer = %referral.referrer_address, bonus_amount, "referral bonus paid");
        Ok(Some(payment))
    }

    /// Summary for a referrer.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the user does not exist.
    pub async fn get_referral_stats(
        &self,
        address: &WalletAddress,
    ) -> Result<ReferralStats, GatewayError> {
        let user = self.get_user(address).await?;
        let referred_users = self.store.referred_users(address.as_str()).await?;
        Ok(ReferralStats {
            referral_code: user.referral_code,
            total_referrals: user.total_referrals,
            total_earnings: user.total_earnings,
            referred_users,
        })
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryReferralStore;

    fn addr(hex40: &str) -> WalletAddress {
        let Ok(a) = WalletAddress::parse(&format!("0x{hex40}")) else {
            panic!("valid address");
        };
        a
    }

    fn service() -> ReferralService {
        ReferralService::new(Arc::new(InMemoryReferralStore::new()))
    }

    #[tokio::test]
    async fn code_is_derived_from_address() {
        let svc = service();
        let alice = addr("2d6048916fd4017d9348563d442a3476a710d335");
        let Ok(user) = svc.create_user(&alice).await else {
            panic!("create");
        };
        assert_eq!(user.referral_code, "2D6048");
        assert!(svc.get_user_by_referral_code("2d6048").await.is_ok());
    }

    #[tokio::test]
    async fn tracking_bumps_referrer_and_rejects_repeats() {
        let svc = service();
        let alice = addr("aaaaaa0000000000000000000000000000000001");
        let bob = addr("bbbbbb0000000000000000000000000000000002");
        let _ = svc.create_user(&alice).await;

        let first = svc.track_referral(&bob, "AAAAAA").await;
        assert!(matches!(first, Ok(Ok(_))));
        assert!(svc.get_user(&alice).await.is_ok_and(|u| u.total_referrals == 1));

        let again = svc.track_referral(&bob, "AAAAAA").await;
        assert!(matches!(again, Ok(Err(ReferralRejection::AlreadyReferred))));
        assert!(svc.get_user(&alice).await.is_ok_and(|u| u.total_referrals == 1));
    }

    #[tokio::test]
    async fn unknown_and_self_referrals_are_rejected() {
        let svc = service();
        let alice = addr("aaaaaa0000000000000000000000000000000001");
        let _ = svc.create_user(&alice).await;

        assert!(matches!(
            svc.track_referral(&alice, "ZZZZZZ").await,
            Ok(Err(ReferralRejection::UnknownCode))
        ));
        assert!(matches!(
            svc.track_referral(&alice, "aaaaaa").await,
            Ok(Err(ReferralRejection::SelfReferral))
        ));
        assert!(svc.get_referral_info(&alice).await.is_err());
    }

    #[tokio::test]
    async fn bonus_accumulates_on_referrer() {
        let svc = service();
        let alice = addr("aaaaaa0000000000000000000000000000000001");
        let bob = addr("bbbbbb0000000000000000000000000000000002");
        let carol = addr("cccccc0000000000000000000000000000000003");
        let _ = svc.create_user(&alice).await;
        let _ = svc.track_referral(&bob, "AAAAAA").await;

        let paid = svc.pay_referral_bonus(&bob, "prompt-1", 2.5, None).await;
        assert!(matches!(paid, Ok(Some(_))));
        let _ = svc.pay_referral_bonus(&bob, "prompt-2", 1.0, Some("0xabc".into())).await;
        assert!(svc.get_user(&alice).await.is_ok_and(|u| (u.total_earnings - 3.5).abs() < 1e-9));

        assert!(matches!(svc.pay_referral_bonus(&carol, "p", 1.0, None).await, Ok(None)));
        assert!(svc.pay_referral_bonus(&bob, "p", -1.0, None).await.is_err());
    }

    #[tokio::test]
    async fn stats_list_newest_referee_first() {
        let svc = service();
        let alice = addr("aaaaaa0000000000000000000000000000000001");
        let bob = addr("bbbbbb0000000000000000000000000000000002");
        let carol = addr("cccccc0000000000000000000000000000000003");
        let _ = svc.create_user(&alice).await;
        let _ = svc.track_referral(&bob, "AAAAAA").await;
        let _ = svc.track_referral(&carol, "AAAAAA").await;

        let Ok(stats) = svc.get_referral_stats(&alice).await else {
            panic!("stats");
        };
        assert_eq!(stats.total_referrals, 2);
        assert_eq!(
            stats.referred_users.first().map(|u| u.referee_address.as_str()),
            Some(carol.as_str())
        );
    }
}
