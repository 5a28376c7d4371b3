//! Newsletter subscriptions.

use log::{info, warn};
use newsdesk_core::db::ConnectionMethods;
use newsdesk_core::AutoPk;

use crate::models::Subscriber;
use crate::validate;
use crate::{now, DataObject, DataObjectOps, DataResult, Error, Result};

/// Subscribe `email` to the newsletter. Addresses are stored trimmed
/// and lower-cased; subscribing twice fails with
/// [`Error::AlreadySubscribed`].
pub fn subscribe(conn: &impl ConnectionMethods, email: &str) -> Result<Subscriber> {
    let email = validate::email(email)?;
    let mut subscriber = Subscriber {
        id: AutoPk::uninitialized(),
        email,
        created_at: now(),
    };
    match subscriber.save(conn) {
        Ok(()) => {
            info!("New subscriber {}", subscriber.email);
            Ok(subscriber)
        }
        Err(e) if e.is_constraint_violation() => {
            warn!("{} is already subscribed", subscriber.email);
            Err(Error::AlreadySubscribed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove `email` from the newsletter. Returns whether it was subscribed.
pub fn unsubscribe(conn: &impl ConnectionMethods, email: &str) -> Result<bool> {
    let email = email.trim().to_lowercase();
    let removed = Subscriber::query()
        .filter(Subscriber::fields().email().eq(email.as_str()))
        .delete(conn)?;
    if removed > 0 {
        info!("Unsubscribed {email}");
    }
    Ok(removed > 0)
}

/// Every subscriber, newest first.
pub fn list_subscribers(conn: &impl ConnectionMethods) -> Result<Vec<Subscriber>> {
    Ok(Subscriber::query()
        .order_desc("created_at")
        .order_desc("id")
        .load(conn)?)
}
