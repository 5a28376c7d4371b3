//! Accounts and sign-in sessions.
//!
//! Passwords are stored as `salt$digest`, where `digest` is the hex
//! encoded result of hashing the salt and password with SHA-256 and
//! then re-hashing the result [`HASH_ROUNDS`] - 1 more times. A
//! session is an opaque random token handed to the client and looked
//! up on every request.

use chrono::Duration;
use log::{info, warn};
use newsdesk_core::db::ConnectionMethods;
use newsdesk_core::AutoPk;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Profile, Session};
use crate::validate;
use crate::{now, DataObject, DataObjectOps, DataResult, Error, Result};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;
/// SHA-256 applications per password hash.
pub const HASH_ROUNDS: u32 = 10_000;

fn salted_digest(salt: &str, password: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..HASH_ROUNDS {
        digest = Sha256::digest(digest);
    }
    hex::encode(digest)
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = hex::encode(rand::random::<[u8; 16]>());
    let digest = salted_digest(&salt, password);
    format!("{salt}${digest}")
}

/// Check `password` against a hash made by [`hash_password`].
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Some((salt, expected)) = hash.split_once('$') else {
        return false;
    };
    let actual = salted_digest(salt, password);
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn new_profile(
    conn: &impl ConnectionMethods,
    email: &str,
    password: &str,
    full_name: Option<&str>,
    is_admin: bool,
) -> Result<Profile> {
    let email = validate::email(email)?;
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Error::invalid(
            "password",
            format!("must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }
    let mut profile = Profile {
        id: AutoPk::uninitialized(),
        email,
        full_name: validate::optional(full_name),
        username: None,
        avatar_url: None,
        password_hash: hash_password(password),
        is_admin,
        created_at: now(),
    };
    match profile.save(conn) {
        Ok(()) => {
            info!(
                "Registered {}{}",
                profile.email,
                if is_admin { " as administrator" } else { "" }
            );
            Ok(profile)
        }
        Err(e) if e.is_constraint_violation() => Err(Error::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

/// Register a reader account.
pub fn sign_up(
    conn: &impl ConnectionMethods,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<Profile> {
    new_profile(conn, email, password, full_name, false)
}

/// Register an account with access to the editorial dashboard.
pub fn create_admin(
    conn: &impl ConnectionMethods,
    email: &str,
    password: &str,
    full_name: Option<&str>,
) -> Result<Profile> {
    new_profile(conn, email, password, full_name, true)
}

fn find_by_email(conn: &impl ConnectionMethods, email: &str) -> Result<Option<Profile>> {
    let email = email.trim().to_lowercase();
    Ok(Profile::query()
        .filter(Profile::fields().email().eq(email.as_str()))
        .load_first(conn)?)
}

/// Start a session lasting `ttl`. An unknown email and a wrong
/// password fail alike with [`Error::InvalidCredentials`].
pub fn sign_in(
    conn: &impl ConnectionMethods,
    email: &str,
    password: &str,
    ttl: Duration,
) -> Result<Session> {
    let profile = match find_by_email(conn, email)? {
        Some(profile) if verify_password(password, &profile.password_hash) => profile,
        _ => {
            warn!("Failed sign-in for {}", email.trim());
            return Err(Error::InvalidCredentials);
        }
    };
    let created_at = now();
    let mut session = Session {
        token: Uuid::new_v4().simple().to_string(),
        profile_id: profile.id.saved()?,
        created_at,
        expires_at: created_at + ttl,
    };
    session.save(conn)?;
    info!("{} signed in", profile.email);
    Ok(session)
}

/// End the session identified by `token`. Returns whether it existed.
pub fn sign_out(conn: &impl ConnectionMethods, token: &str) -> Result<bool> {
    let removed = Session::query()
        .filter(Session::fields().token().eq(token))
        .delete(conn)?;
    Ok(removed > 0)
}

/// The profile signed in with `token`. Expired sessions are removed
/// and reported as [`Error::SessionExpired`].
pub fn current_profile(conn: &impl ConnectionMethods, token: &str) -> Result<Profile> {
    let session = Session::try_get(conn, token)?.ok_or(Error::Unauthenticated)?;
    if session.is_expired() {
        session.delete(conn)?;
        return Err(Error::SessionExpired);
    }
    Profile::try_get(conn, session.profile_id)?.ok_or(Error::Unauthenticated)
}

/// Like [`current_profile`], but the profile must be an administrator.
pub fn require_admin(conn: &impl ConnectionMethods, token: &str) -> Result<Profile> {
    let profile = current_profile(conn, token)?;
    if !profile.is_admin {
        warn!("{} is not an administrator", profile.email);
        return Err(Error::Forbidden);
    }
    Ok(profile)
}

/// Delete every expired session, returning how many were removed.
pub fn purge_expired_sessions(conn: &impl ConnectionMethods) -> Result<usize> {
    Ok(Session::query()
        .filter(Session::fields().expires_at().le(now()))
        .delete(conn)?)
}
