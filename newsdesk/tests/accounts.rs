use chrono::Duration;
use newsdesk::auth;
use newsdesk::models::SiteSettings;
use newsdesk::settings::{self, SettingFlag};
use newsdesk::subscribers;
use newsdesk::Error;
use newsdesk_test_helper::*;
use pretty_assertions::assert_eq;

#[test_log::test]
fn sign_in_and_out() {
    let conn = sqlite_connection();
    let profile = auth::sign_up(&conn, " Reader@Example.com ", PASSWORD, Some("Amina")).unwrap();
    assert_eq!(profile.email, "reader@example.com");
    assert!(!profile.is_admin);

    assert!(matches!(
        auth::sign_in(&conn, "reader@example.com", "wrong password", Duration::hours(1)),
        Err(Error::InvalidCredentials)
    ));
    assert!(matches!(
        auth::sign_in(&conn, "nobody@example.com", PASSWORD, Duration::hours(1)),
        Err(Error::InvalidCredentials)
    ));

    let session = auth::sign_in(&conn, "READER@example.com", PASSWORD, Duration::hours(1)).unwrap();
    let current = auth::current_profile(&conn, &session.token).unwrap();
    assert_eq!(current.email, "reader@example.com");
    assert_eq!(current.display_name(), "Amina");
    assert!(matches!(
        auth::require_admin(&conn, &session.token),
        Err(Error::Forbidden)
    ));

    assert!(auth::sign_out(&conn, &session.token).unwrap());
    assert!(!auth::sign_out(&conn, &session.token).unwrap());
    assert!(matches!(
        auth::current_profile(&conn, &session.token),
        Err(Error::Unauthenticated)
    ));
}

#[test]
fn accounts_are_validated() {
    let conn = sqlite_connection();
    reader(&conn, "taken@example.com");
    assert!(matches!(
        auth::sign_up(&conn, "TAKEN@example.com", PASSWORD, None),
        Err(Error::EmailTaken)
    ));
    assert!(matches!(
        auth::sign_up(&conn, "short@example.com", "1234567", None),
        Err(Error::Validation {
            field: "password",
            ..
        })
    ));
    assert!(matches!(
        auth::sign_up(&conn, "not-an-email", PASSWORD, None),
        Err(Error::Validation { field: "email", .. })
    ));
}

#[test]
fn expired_sessions() {
    let conn = sqlite_connection();
    reader(&conn, "late@example.com");
    let stale = auth::sign_in(&conn, "late@example.com", PASSWORD, Duration::seconds(-5)).unwrap();
    let fresh = auth::sign_in(&conn, "late@example.com", PASSWORD, Duration::hours(1)).unwrap();
    let stale2 = auth::sign_in(&conn, "late@example.com", PASSWORD, Duration::seconds(-5)).unwrap();

    assert!(matches!(
        auth::current_profile(&conn, &stale.token),
        Err(Error::SessionExpired)
    ));
    // The expired session is gone after the failed lookup.
    assert!(matches!(
        auth::current_profile(&conn, &stale.token),
        Err(Error::Unauthenticated)
    ));
    assert_eq!(auth::purge_expired_sessions(&conn).unwrap(), 1);
    assert!(matches!(
        auth::current_profile(&conn, &stale2.token),
        Err(Error::Unauthenticated)
    ));
    auth::current_profile(&conn, &fresh.token).unwrap();
}

#[test]
fn admins_pass_the_guard() {
    let conn = sqlite_connection();
    let session = admin_session(&conn, "editor@example.com");
    let admin = auth::require_admin(&conn, &session.token).unwrap();
    assert!(admin.is_admin);
    assert_eq!(admin.display_name(), "Desk Editor");
}

#[test]
fn subscribe_once() {
    let conn = sqlite_connection();
    let sub = subscribers::subscribe(&conn, "  News@Example.com").unwrap();
    assert_eq!(sub.email, "news@example.com");
    assert!(matches!(
        subscribers::subscribe(&conn, "news@example.com"),
        Err(Error::AlreadySubscribed)
    ));
    assert!(matches!(
        subscribers::subscribe(&conn, "news at example"),
        Err(Error::Validation { .. })
    ));
    subscribers::subscribe(&conn, "second@example.com").unwrap();
    let emails: Vec<String> = subscribers::list_subscribers(&conn)
        .unwrap()
        .into_iter()
        .map(|s| s.email)
        .collect();
    assert_eq!(emails, vec!["second@example.com", "news@example.com"]);

    assert!(subscribers::unsubscribe(&conn, "NEWS@example.com").unwrap());
    assert!(!subscribers::unsubscribe(&conn, "news@example.com").unwrap());
}

#[test]
fn settings_toggle_and_save() {
    let conn = sqlite_connection();
    let defaults = settings::load_settings(&conn).unwrap();
    assert_eq!(defaults, SiteSettings::default());

    assert!(settings::toggle(&conn, SettingFlag::MaintenanceMode).unwrap());
    assert!(settings::load_settings(&conn).unwrap().maintenance_mode);
    assert!(!settings::toggle(&conn, SettingFlag::MaintenanceMode).unwrap());
    assert!(!settings::set_flag(&conn, SettingFlag::EmailNotifications, Some(false)).unwrap());
    assert!(!settings::set_flag(&conn, SettingFlag::EmailNotifications, Some(false)).unwrap());

    let mut changed = settings::load_settings(&conn).unwrap();
    changed.site_name = "  Capital News Daily ".to_string();
    changed.twitter_url = String::new();
    settings::save_settings(&conn, &mut changed).unwrap();
    let stored = settings::load_settings(&conn).unwrap();
    assert_eq!(stored.site_name, "Capital News Daily");
    assert_eq!(stored.twitter_url, "");
    assert!(!stored.email_notifications);
    assert!(stored.updated_at.is_some());

    let mut bad = stored.clone();
    bad.facebook_url = "facebook".to_string();
    assert!(matches!(
        settings::save_settings(&conn, &mut bad),
        Err(Error::Validation {
            field: "facebook_url",
            ..
        })
    ));
    bad.facebook_url = String::new();
    bad.site_name = " ".to_string();
    assert!(settings::save_settings(&conn, &mut bad).is_err());
}
