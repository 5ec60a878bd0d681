//! Profile resolution: candidate address -> social handle -> audience
//! metrics -> maybe an [`Alert`].
//!
//! "No profile for this address" and "audience below threshold" are expected
//! empty outcomes, not faults. A social-network lookup failure is logged
//! here and drops the candidate; a profile-API transport failure propagates
//! to the per-transaction boundary.

use crate::alert::Alert;
use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Bound on any single lookup so a stalled API cannot wedge the pipeline.
const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

fn http_client() -> Client {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
}

/// A resolved social profile for an on-chain address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialProfile {
    pub handle: String,
    pub address: String,
}

/// Account metadata from the social network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMetrics {
    pub created_at: DateTime<Utc>,
    pub followers: u64,
}

/// Profile-lookup API seam (address -> handle).
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// `Ok(None)` when the address has no profile; `Err` only on transport
    /// faults.
    async fn user_by_address(&self, address: Address) -> anyhow::Result<Option<SocialProfile>>;
}

/// Social-network API seam (handle -> account metadata).
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn account_metrics(&self, handle: &str) -> anyhow::Result<AccountMetrics>;
}

/// Kosetto-style profile-lookup API: `GET /users/{address}`.
pub struct KosettoProfileApi {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct KosettoUser {
    #[serde(default, rename = "twitterUsername")]
    twitter_username: String,
    #[serde(default)]
    address: String,
}

impl KosettoProfileApi {
    pub fn new(base_url: String) -> Self {
        Self {
            http: http_client(),
            base_url,
        }
    }
}

#[async_trait]
impl ProfileApi for KosettoProfileApi {
    async fn user_by_address(&self, address: Address) -> anyhow::Result<Option<SocialProfile>> {
        let url = format!("{}/users/{address:#x}", self.base_url);
        let resp = self.http.get(&url).send().await?;

        // Non-success covers the expected "no profile for this address" case.
        if !resp.status().is_success() {
            debug!(address = %address, status = %resp.status(), "no profile for address");
            return Ok(None);
        }

        let user: KosettoUser = resp.json().await?;
        if user.twitter_username.is_empty() {
            return Ok(None);
        }

        Ok(Some(SocialProfile {
            handle: user.twitter_username,
            address: user.address,
        }))
    }
}

/// Twitter v1.1 `users/show` with app-only bearer auth.
pub struct TwitterSocialApi {
    http: Client,
    api_url: String,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    created_at: String,
    followers_count: u64,
}

impl TwitterSocialApi {
    pub fn new(api_url: String, bearer_token: String) -> Self {
        Self {
            http: http_client(),
            api_url,
            bearer_token,
        }
    }
}

#[async_trait]
impl SocialApi for TwitterSocialApi {
    async fn account_metrics(&self, handle: &str) -> anyhow::Result<AccountMetrics> {
        let url = format!("{}/1.1/users/show.json", self.api_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("screen_name", handle)])
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("social API returned status {}", resp.status());
        }

        let user: TwitterUser = resp.json().await?;
        let created_at = parse_created_at(&user.created_at)?;

        Ok(AccountMetrics {
            created_at,
            followers: user.followers_count,
        })
    }
}

/// Twitter's legacy timestamp format, with RFC 3339 as a fallback.
fn parse_created_at(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Ok(t.with_timezone(&Utc));
    }
    let t = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("unparseable created_at {raw:?}: {e}"))?;
    Ok(t.with_timezone(&Utc))
}

/// Whole days between account creation and `now`, floored.
pub(crate) fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now.timestamp_millis() - created_at.timestamp_millis()).div_euclid(MILLIS_PER_DAY)
}

/// Resolves fresh candidates to alerts, applying the audience threshold.
pub struct ProfileResolver {
    profile: Arc<dyn ProfileApi>,
    social: Arc<dyn SocialApi>,
    follower_threshold: u64,
}

impl ProfileResolver {
    pub fn new(
        profile: Arc<dyn ProfileApi>,
        social: Arc<dyn SocialApi>,
        follower_threshold: u64,
    ) -> Self {
        Self {
            profile,
            social,
            follower_threshold,
        }
    }

    /// `Ok(None)` for every expected drop (no profile, lookup failure,
    /// below threshold); `Err` only for profile-API transport faults.
    pub async fn resolve(&self, address: Address) -> anyhow::Result<Option<Alert>> {
        let Some(profile) = self.profile.user_by_address(address).await? else {
            return Ok(None);
        };

        let metrics = match self.social.account_metrics(&profile.handle).await {
            Ok(m) => m,
            Err(e) => {
                warn!(handle = %profile.handle, error = %e, "social lookup failed");
                return Ok(None);
            }
        };

        let age_days = age_in_days(metrics.created_at, Utc::now());
        info!(
            handle = %profile.handle,
            followers = metrics.followers,
            age_days = age_days,
            address = %profile.address,
            "resolved joining profile"
        );

        if metrics.followers < self.follower_threshold {
            return Ok(None);
        }

        // Prefer the address string the profile API reports; it is the one
        // operators look up on the explorer.
        let alert_address = if profile.address.is_empty() {
            format!("{address:#x}")
        } else {
            profile.address
        };

        Ok(Some(Alert {
            address: alert_address,
            handle: profile.handle,
            age_days,
            followers: metrics.followers,
        }))
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::{FakeProfileApi, FakeSocialApi};
    use super::*;
    use chrono::Duration;

    fn address() -> Address {
        "0x00000000000000000000000000000000abcd1234"
            .parse()
            .unwrap()
    }

    fn metrics(followers: u64, age: Duration) -> AccountMetrics {
        AccountMetrics {
            created_at: Utc::now() - age,
            followers,
        }
    }

    fn resolver(profile: FakeProfileApi, social: FakeSocialApi) -> ProfileResolver {
        ProfileResolver::new(Arc::new(profile), Arc::new(social), 20_000)
    }

    #[test]
    fn age_floors_to_whole_days() {
        let now = Utc::now();
        assert_eq!(age_in_days(now - Duration::hours(24), now), 1);
        assert_eq!(age_in_days(now - Duration::minutes(23 * 60 + 59), now), 0);
        assert_eq!(age_in_days(now - Duration::days(10), now), 10);
    }

    #[test]
    fn parses_twitter_timestamp() {
        let t = parse_created_at("Sat Aug 19 14:00:00 +0000 2023").unwrap();
        assert_eq!(t.timestamp(), 1_692_453_600);

        let t = parse_created_at("2023-08-19T14:00:00Z").unwrap();
        assert_eq!(t.timestamp(), 1_692_453_600);

        assert!(parse_created_at("yesterday").is_err());
    }

    #[tokio::test]
    async fn alert_at_threshold_inclusive() {
        let resolver = resolver(
            FakeProfileApi::with_profile(address(), "alice"),
            FakeSocialApi::with_account("alice", metrics(20_000, Duration::days(3))),
        );

        let alert = resolver.resolve(address()).await.unwrap().unwrap();
        assert_eq!(alert.handle, "alice");
        assert_eq!(alert.followers, 20_000);
        assert_eq!(alert.age_days, 3);
    }

    #[tokio::test]
    async fn below_threshold_produces_nothing() {
        let resolver = resolver(
            FakeProfileApi::with_profile(address(), "alice"),
            FakeSocialApi::with_account("alice", metrics(19_999, Duration::days(3))),
        );

        assert!(resolver.resolve(address()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_profile_is_not_an_error() {
        let resolver = resolver(FakeProfileApi::default(), FakeSocialApi::default());
        assert!(resolver.resolve(address()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_transport_fault_propagates() {
        let resolver = resolver(
            FakeProfileApi {
                fail: true,
                ..Default::default()
            },
            FakeSocialApi::default(),
        );

        assert!(resolver.resolve(address()).await.is_err());
    }

    #[tokio::test]
    async fn social_failure_drops_candidate() {
        let resolver = resolver(
            FakeProfileApi::with_profile(address(), "alice"),
            FakeSocialApi {
                fail: true,
                ..Default::default()
            },
        );

        // Logged and dropped, not an error.
        assert!(resolver.resolve(address()).await.unwrap().is_none());
    }
}
