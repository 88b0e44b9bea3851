//! OTP lifecycle orchestration across the primary and fallback stores

use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sf_shared::config::OtpConfig;
use sf_shared::utils::phone::{is_valid_phone, mask_phone_number, normalize_phone_number};

use crate::domain::entities::otp_record::{format_remaining_time, OtpRecord, OtpStatus};
use crate::errors::{DomainResult, OtpError};
use crate::repositories::BanRepository;

use super::backend_state::BackendStatus;
use super::fallback_store::FallbackStore;
use super::hasher::SecretHasher;
use super::key_lock::KeyedLocks;
use super::traits::{IdentityResolver, OtpDelivery, PrimaryStore};
use super::types::{DeliveryStatus, IssueOutcome, StoreClaim, StoredIn, VerifyOutcome};

/// Store a live record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordSource {
    Primary,
    Fallback,
}

#[derive(Debug)]
struct LiveRecord {
    secret_hash: String,
    remaining_seconds: u64,
    source: RecordSource,
}

/// Issues, verifies and consumes one-time passcodes
///
/// The primary store is authoritative while available. The fallback store
/// is written when the primary is degraded or a primary write fails, and
/// receives a mirror of every primary write when `mirror_to_fallback` is
/// set. It is only read while the primary is degraded.
pub struct OtpManager<P, D, B, I>
where
    P: PrimaryStore,
    D: OtpDelivery,
    B: BanRepository,
    I: IdentityResolver,
{
    primary: Arc<P>,
    fallback: Arc<FallbackStore>,
    delivery: Arc<D>,
    bans: Arc<B>,
    identity: Arc<I>,
    hasher: SecretHasher,
    locks: KeyedLocks,
    config: OtpConfig,
}

impl<P, D, B, I> OtpManager<P, D, B, I>
where
    P: PrimaryStore,
    D: OtpDelivery,
    B: BanRepository,
    I: IdentityResolver,
{
    /// Create a new OTP manager
    ///
    /// # Arguments
    ///
    /// * `primary` - Primary store adapter; also owns the backend state
    /// * `fallback` - Fallback store shared with its sweeper
    /// * `delivery` - SMS delivery collaborator
    /// * `bans` - Ban list lookup
    /// * `identity` - Identity resolver invoked after a successful verification
    /// * `config` - OTP lifecycle configuration
    pub fn new(
        primary: Arc<P>,
        fallback: Arc<FallbackStore>,
        delivery: Arc<D>,
        bans: Arc<B>,
        identity: Arc<I>,
        config: OtpConfig,
    ) -> Self {
        let config = config.normalized();
        Self {
            primary,
            fallback,
            delivery,
            bans,
            identity,
            hasher: SecretHasher::new(config.hash_work_factor),
            locks: KeyedLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Current reachability of the primary store
    pub fn backend_status(&self) -> BackendStatus {
        self.primary.backend_state().status()
    }

    /// Start the periodic fallback sweep
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        self.fallback
            .clone()
            .start_sweeper(Duration::from_secs(self.config.sweep_interval_seconds))
    }

    /// Issue a code for a phone number
    ///
    /// This method:
    /// 1. Rejects banned phone numbers
    /// 2. Serializes on the phone number so check-then-write is atomic in-process
    /// 3. Returns `AlreadyPending` while a live code exists
    /// 4. Generates, hashes and stores a new code
    /// 5. Hands the code to the delivery collaborator
    ///
    /// Delivery failures are reported in the outcome; the stored code stays live.
    pub async fn issue(&self, phone: &str) -> DomainResult<IssueOutcome> {
        let key = self.identity_key(phone)?;
        let masked = mask_phone_number(&key);

        if self.bans.is_banned(&key).await? {
            warn!(phone = %masked, event = "otp_forbidden", "OTP requested for banned phone number");
            return Err(OtpError::Forbidden.into());
        }

        let guard = self.locks.acquire(&key).await;

        if let Some(live) = self.lookup(&key).await {
            info!(
                phone = %masked,
                remaining_seconds = live.remaining_seconds,
                event = "otp_already_pending",
                "Live OTP exists, not issuing a new one"
            );
            return Ok(already_pending(live.remaining_seconds));
        }

        let code = self.generate_code();
        let secret_hash = self.hasher.hash(&code).await?;
        let record = OtpRecord::issue(key.clone(), secret_hash, self.config.validity_duration_seconds);

        let stored_in = match self.store(&record).await {
            Some(stored_in) => stored_in,
            None => {
                // Another issuer won the race for this key
                let remaining = self
                    .lookup(&key)
                    .await
                    .map(|live| live.remaining_seconds)
                    .unwrap_or(self.config.validity_duration_seconds);
                info!(phone = %masked, event = "otp_already_pending", "Lost issuance race");
                return Ok(already_pending(remaining));
            }
        };
        drop(guard);

        info!(
            phone = %masked,
            stored_in = ?stored_in,
            expires_at = %record.expires_at,
            event = "otp_generated",
            "Generated new OTP"
        );

        let delivery = self.deliver(&key, &code).await;

        Ok(IssueOutcome::Issued {
            code,
            expires_at: record.expires_at,
            stored_in,
            delivery,
        })
    }

    /// Verify and consume a code
    ///
    /// A wrong code leaves the record live until the lockout threshold is
    /// reached. A correct code deletes the record from both stores before
    /// the identity is resolved, so it can succeed only once.
    pub async fn verify(&self, phone: &str, candidate: &str) -> DomainResult<VerifyOutcome> {
        let key = self.identity_key(phone)?;
        let masked = mask_phone_number(&key);

        let guard = self.locks.acquire(&key).await;

        let live = match self.lookup(&key).await {
            Some(live) => live,
            None => {
                info!(phone = %masked, event = "otp_expired", "No live OTP to verify");
                return Err(OtpError::Expired.into());
            }
        };

        if !self.hasher.compare(candidate, &live.secret_hash).await {
            return Err(self.register_failure(&key, &live).await.into());
        }

        self.consume(&key).await;
        drop(guard);

        info!(phone = %masked, source = ?live.source, event = "otp_verified", "OTP verified");

        let grant = self.identity.find_or_create_identity(&key).await?;
        Ok(VerifyOutcome { grant })
    }

    /// Whether a live code exists and how long it has left
    pub async fn status(&self, phone: &str) -> DomainResult<OtpStatus> {
        let key = self.identity_key(phone)?;
        Ok(match self.lookup(&key).await {
            Some(live) => OtpStatus::live(live.remaining_seconds),
            None => OtpStatus::expired(),
        })
    }

    fn identity_key(&self, phone: &str) -> Result<String, OtpError> {
        let key = normalize_phone_number(phone);
        if !is_valid_phone(&key) {
            return Err(OtpError::InvalidIdentity {
                phone: phone.to_string(),
            });
        }
        Ok(key)
    }

    fn primary_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }

    fn attempts_key(&self, key: &str) -> String {
        format!("{}_ATTEMPTS:{}", self.config.key_prefix, key)
    }

    fn generate_code(&self) -> String {
        if let Some(code) = &self.config.fixed_code {
            return code.clone();
        }

        let mut rng = OsRng;
        (0..self.config.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Read the primary store; consult the fallback only while degraded
    async fn lookup(&self, key: &str) -> Option<LiveRecord> {
        let primary_key = self.primary_key(key);

        if let Some(secret_hash) = self.primary.get(&primary_key).await {
            let remaining_seconds = match self.primary.ttl(&primary_key).await {
                // Redis rounds, so a key in its last half second answers 0
                ttl if ttl >= 0 => Some((ttl as u64).max(1)),
                // Expired between the read and the TTL query
                -2 => None,
                _ => Some(self.config.validity_duration_seconds),
            };
            if let Some(remaining_seconds) = remaining_seconds {
                return Some(LiveRecord {
                    secret_hash,
                    remaining_seconds,
                    source: RecordSource::Primary,
                });
            }
        }

        // Checked after the read so a failed read falls through here
        if self.primary.backend_state().is_degraded() {
            return self.fallback.get(key).await.map(|found| LiveRecord {
                secret_hash: found.secret_hash,
                remaining_seconds: found.remaining_seconds,
                source: RecordSource::Fallback,
            });
        }

        None
    }

    /// Make the record discoverable from at least one store
    ///
    /// Returns `None` when another issuer already holds the key.
    async fn store(&self, record: &OtpRecord) -> Option<StoredIn> {
        let key = record.identity_key.as_str();
        let ttl = self.config.validity_duration_seconds;

        if self.primary.backend_state().is_available() {
            match self
                .primary
                .set_if_absent_with_expiry(&self.primary_key(key), &record.secret_hash, ttl)
                .await
            {
                StoreClaim::Claimed => {
                    self.primary.delete(&self.attempts_key(key)).await;
                    if self.config.mirror_to_fallback {
                        self.fallback.put(key, &record.secret_hash, ttl).await;
                        return Some(StoredIn::PrimaryAndFallback);
                    }
                    // An entry left from a degraded period must not shadow this code
                    self.fallback.delete(key).await;
                    return Some(StoredIn::Primary);
                }
                StoreClaim::Occupied => return None,
                StoreClaim::Failed => {
                    debug!(event = "primary_write_failed", "Primary write failed, using fallback store");
                }
            }
        }

        if self.fallback.put_if_absent(key, &record.secret_hash, ttl).await {
            Some(StoredIn::Fallback)
        } else {
            None
        }
    }

    async fn deliver(&self, key: &str, code: &str) -> DeliveryStatus {
        match self.delivery.send_otp(key, code).await {
            Ok(message_id) => {
                info!(
                    phone = %mask_phone_number(key),
                    message_id = %message_id,
                    event = "otp_sent",
                    "OTP handed to delivery"
                );
                DeliveryStatus::Delivered { message_id }
            }
            Err(reason) => {
                warn!(
                    phone = %mask_phone_number(key),
                    error = %reason,
                    event = "delivery_failed",
                    "OTP delivery failed, code remains valid"
                );
                DeliveryStatus::Failed { reason }
            }
        }
    }

    /// Count a wrong guess and decide between `Incorrect` and a lockout
    async fn register_failure(&self, key: &str, live: &LiveRecord) -> OtpError {
        let masked = mask_phone_number(key);

        if !self.config.lockout_enabled() {
            warn!(phone = %masked, event = "otp_incorrect", "Incorrect OTP");
            return OtpError::Incorrect;
        }

        let attempts = match live.source {
            RecordSource::Primary => {
                let counted = self
                    .primary
                    .increment_with_expiry(&self.attempts_key(key), live.remaining_seconds.max(1))
                    .await
                    .map(|count| count.max(0) as u64);
                match counted {
                    Some(count) => Some(count),
                    None => self.fallback.record_failed_attempt(key).await.map(u64::from),
                }
            }
            RecordSource::Fallback => self.fallback.record_failed_attempt(key).await.map(u64::from),
        };

        let max_attempts = u64::from(self.config.max_verify_attempts);
        if attempts.is_some_and(|count| count >= max_attempts) {
            self.consume(key).await;
            warn!(
                phone = %masked,
                attempts = max_attempts,
                event = "otp_locked_out",
                "Too many incorrect OTP attempts, code revoked"
            );
            return OtpError::TooManyAttempts;
        }

        warn!(
            phone = %masked,
            attempts = attempts.unwrap_or_default(),
            event = "otp_incorrect",
            "Incorrect OTP"
        );
        OtpError::Incorrect
    }

    /// Delete the record and its attempt counter from both stores
    async fn consume(&self, key: &str) {
        self.primary.delete(&self.primary_key(key)).await;
        self.primary.delete(&self.attempts_key(key)).await;
        self.fallback.delete(key).await;
    }
}

fn already_pending(remaining_seconds: u64) -> IssueOutcome {
    IssueOutcome::AlreadyPending {
        remaining_time: format_remaining_time(remaining_seconds),
    }
}
