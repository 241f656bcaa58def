//! Client and guest identifiers used for server-side session correlation.
//!
//! The client id lives for one tab, the guest id for one browser. Both are
//! random UUIDs when storage works; hosts without storage fall back to a
//! prefixed base-36 token regenerated on every load.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::constants::{CLIENT_ID_FALLBACK_PREFIX, GUEST_ID_FALLBACK_PREFIX};
use crate::protocol::ClientIds;

/// Random v4 UUID string drawn from `rng`.
#[must_use]
pub fn random_uuid<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}

/// Lowercase base-36 rendering of `value`.
#[must_use]
pub fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        let digit = usize::try_from(value % 36).unwrap_or(0);
        out.push(DIGITS[digit]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn fallback_token<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    format!("{prefix}{}", base36(rng.r#gen::<u64>()))
}

/// Identifier pair attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    ids: ClientIds,
    persistent: bool,
}

/// Which freshly generated identifiers the host should write back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityWrites {
    pub client_id: Option<String>,
    pub guest_id: Option<String>,
}

impl SessionIdentity {
    /// Reuse stored identifiers where present and generate the rest.
    ///
    /// `storage_available` selects UUIDs (persisted by the host) or
    /// prefixed fallback tokens (never persisted).
    #[must_use]
    pub fn resolve(
        stored_client: Option<String>,
        stored_guest: Option<String>,
        storage_available: bool,
        entropy: u64,
    ) -> (Self, IdentityWrites) {
        let mut rng = ChaCha20Rng::seed_from_u64(entropy);
        let mut writes = IdentityWrites::default();
        let valid = |id: &Option<String>| id.as_ref().filter(|v| !v.trim().is_empty()).cloned();

        let client_id = valid(&stored_client).unwrap_or_else(|| {
            if storage_available {
                let id = random_uuid(&mut rng);
                writes.client_id = Some(id.clone());
                id
            } else {
                fallback_token(CLIENT_ID_FALLBACK_PREFIX, &mut rng)
            }
        });
        let guest_id = valid(&stored_guest).unwrap_or_else(|| {
            if storage_available {
                let id = random_uuid(&mut rng);
                writes.guest_id = Some(id.clone());
                id
            } else {
                fallback_token(GUEST_ID_FALLBACK_PREFIX, &mut rng)
            }
        });

        (
            Self {
                ids: ClientIds {
                    client_id,
                    guest_id,
                },
                persistent: storage_available,
            },
            writes,
        )
    }

    /// Identity with explicit values, used by tests and tools.
    #[must_use]
    pub fn fixed(client_id: impl Into<String>, guest_id: impl Into<String>) -> Self {
        Self {
            ids: ClientIds {
                client_id: client_id.into(),
                guest_id: guest_id.into(),
            },
            persistent: true,
        }
    }

    #[must_use]
    pub const fn ids(&self) -> &ClientIds {
        &self.ids
    }

    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }
}
