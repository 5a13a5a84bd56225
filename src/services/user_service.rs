use chrono::Utc;
use hex::encode as hex_encode;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::config::{DEFAULT_PBKDF2_ITERATIONS, SUPER_ADMIN_ROLE};
use crate::models::CurrentUser;
use crate::services::credential_store::{CredentialDirectory, StoreError};

pub fn generate_password_hash(password: &str) -> String {
    let mut salt_bytes = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = hex_encode(salt_bytes);
    let mut dk = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), DEFAULT_PBKDF2_ITERATIONS, &mut dk);
    let hash_hex = hex_encode(dk);
    format!("pbkdf2:sha256:{}${}${}", DEFAULT_PBKDF2_ITERATIONS, salt, hash_hex)
}

pub fn verify_password(stored: &str, candidate: &str) -> bool {
    if let Some(rest) = stored.strip_prefix("pbkdf2:sha256:") {
        if let Some((iter_s, salt_hash)) = rest.split_once('$') {
            if let Some((salt, expected_hash)) = salt_hash.split_once('$') {
                if let Ok(iter) = iter_s.parse::<u32>() {
                    if iter == 0 {
                        return false;
                    }
                    let mut dk = [0u8; 32];
                    pbkdf2_hmac::<Sha256>(candidate.as_bytes(), salt.as_bytes(), iter, &mut dk);
                    let computed = hex_encode(dk);
                    return constant_time_eq(&computed, expected_hash);
                }
            }
        }
    }
    false
}

/// Compares without stopping at the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

pub fn random_session_id() -> String {
    let mut b = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut b);
    hex_encode(b)
}

/// Creates the bootstrap administrator with the SuperAdmin role unless an
/// account with that name already exists. Returns true when it was created.
pub fn ensure_admin_account(
    directory: &dyn CredentialDirectory,
    username: &str,
    password: &str,
) -> Result<bool, StoreError> {
    let created = directory.create_if_absent(
        username,
        &generate_password_hash(password),
        &[SUPER_ADMIN_ROLE],
        Some(Utc::now()),
    )?;
    if created {
        tracing::info!(username, role = SUPER_ADMIN_ROLE, "Created bootstrap admin account");
    } else {
        tracing::debug!(username, "Bootstrap admin account already present");
    }
    Ok(created)
}

/// Checks a login attempt. Unknown, inactive and wrong-password accounts all
/// look the same to the caller.
pub fn authenticate(
    directory: &dyn CredentialDirectory,
    username: &str,
    password: &str,
) -> Result<Option<CurrentUser>, StoreError> {
    let Some(record) = directory.find_by_username(username)? else {
        return Ok(None);
    };
    if !record.active || !verify_password(&record.password, password) {
        return Ok(None);
    }
    let roles = directory
        .roles_of(record.id)?
        .into_iter()
        .map(|r| r.name)
        .collect();
    Ok(Some(CurrentUser {
        username: record.username,
        roles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credential_store::JsonCredentialStore;

    #[test]
    fn hash_round_trips_and_rejects_wrong_password() {
        let hash = generate_password_hash("MyPassword");
        assert!(hash.starts_with("pbkdf2:sha256:100000$"));
        assert!(verify_password(&hash, "MyPassword"));
        assert!(!verify_password(&hash, "mypassword"));
    }

    #[test]
    fn hash_comparison_checks_every_byte() {
        assert!(constant_time_eq("abcd", "abcd"));
        assert!(!constant_time_eq("abcd", "abce"));
        assert!(!constant_time_eq("abcd", "xbcd"));
        assert!(!constant_time_eq("abcd", "abc"));

        let hash = generate_password_hash("pw");
        let mut tampered = hash.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        assert!(verify_password(&hash, "pw"));
        assert!(!verify_password(&tampered, "pw"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("", "x"));
        assert!(!verify_password("plain-text", "plain-text"));
        assert!(!verify_password("pbkdf2:sha256:abc$salt$hash", "x"));
        assert!(!verify_password("pbkdf2:sha256:0$salt$hash", "x"));
    }

    #[test]
    fn session_ids_are_random_hex() {
        let a = random_session_id();
        let b = random_session_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn bootstrap_admin_is_created_once() {
        let store = JsonCredentialStore::in_memory();
        assert!(ensure_admin_account(&store, "Admin", "MyPassword").unwrap());
        assert!(!ensure_admin_account(&store, "admin", "Other").unwrap());

        let user = authenticate(&store, "ADMIN", "MyPassword").unwrap().unwrap();
        assert_eq!(user.username, "admin");
        assert!(user.has_role(SUPER_ADMIN_ROLE));
        assert!(authenticate(&store, "admin", "Other").unwrap().is_none());
    }

    #[test]
    fn unknown_user_does_not_authenticate() {
        let store = JsonCredentialStore::in_memory();
        assert!(authenticate(&store, "ghost", "pw").unwrap().is_none());
    }
}
