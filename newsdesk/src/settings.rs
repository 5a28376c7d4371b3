//! Site-wide settings toggled from the dashboard.

use std::fmt;
use std::str::FromStr;

use log::info;
use newsdesk_core::db::ConnectionMethods;
use serde::{Deserialize, Serialize};

use crate::models::{SiteSettings, SETTINGS_ID};
use crate::validate;
use crate::{now, DataObjectOps, Error, Result};

/// The current settings. The default settings are stored first if the
/// row is missing.
pub fn load_settings(conn: &impl ConnectionMethods) -> Result<SiteSettings> {
    if let Some(settings) = SiteSettings::try_get(conn, SETTINGS_ID)? {
        return Ok(settings);
    }
    let mut settings = SiteSettings::default();
    settings.save(conn)?;
    info!("Stored default site settings");
    Ok(settings)
}

/// Store `settings` as the site settings.
pub fn save_settings(conn: &impl ConnectionMethods, settings: &mut SiteSettings) -> Result<()> {
    settings.id = SETTINGS_ID;
    settings.site_name = validate::required("site_name", &settings.site_name)?;
    for (field, url) in [
        ("facebook_url", &mut settings.facebook_url),
        ("twitter_url", &mut settings.twitter_url),
        ("instagram_url", &mut settings.instagram_url),
    ] {
        let trimmed = url.trim().to_string();
        if !trimmed.is_empty() {
            validate::link(field, &trimmed)?;
        }
        *url = trimmed;
    }
    settings.updated_at = Some(now());
    settings.save(conn)?;
    info!("Saved site settings");
    Ok(())
}

/// A boolean site setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingFlag {
    MaintenanceMode,
    PublicComments,
    EmailNotifications,
}

impl SettingFlag {
    /// Every flag, in dashboard order.
    pub const ALL: [SettingFlag; 3] = [
        SettingFlag::MaintenanceMode,
        SettingFlag::PublicComments,
        SettingFlag::EmailNotifications,
    ];

    /// The kebab-case name used in URLs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            SettingFlag::MaintenanceMode => "maintenance-mode",
            SettingFlag::PublicComments => "public-comments",
            SettingFlag::EmailNotifications => "email-notifications",
        }
    }

    /// The flag's value in `settings`.
    pub fn get(self, settings: &SiteSettings) -> bool {
        match self {
            SettingFlag::MaintenanceMode => settings.maintenance_mode,
            SettingFlag::PublicComments => settings.public_comments,
            SettingFlag::EmailNotifications => settings.email_notifications,
        }
    }

    fn get_mut(self, settings: &mut SiteSettings) -> &mut bool {
        match self {
            SettingFlag::MaintenanceMode => &mut settings.maintenance_mode,
            SettingFlag::PublicComments => &mut settings.public_comments,
            SettingFlag::EmailNotifications => &mut settings.email_notifications,
        }
    }
}

impl FromStr for SettingFlag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        SettingFlag::ALL
            .into_iter()
            .find(|flag| flag.name() == wanted)
            .ok_or_else(|| Error::UnknownSetting(s.to_string()))
    }
}

impl fmt::Display for SettingFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flip `flag` and return its new value.
pub fn toggle(conn: &impl ConnectionMethods, flag: SettingFlag) -> Result<bool> {
    set_flag(conn, flag, None)
}

/// Set `flag` to `value`, or flip it when `value` is `None`. Returns
/// the new value.
pub fn set_flag(
    conn: &impl ConnectionMethods,
    flag: SettingFlag,
    value: Option<bool>,
) -> Result<bool> {
    let mut settings = load_settings(conn)?;
    let slot = flag.get_mut(&mut settings);
    *slot = value.unwrap_or(!*slot);
    let new_value = *slot;
    settings.updated_at = Some(now());
    settings.save(conn)?;
    info!("Setting {flag} is now {}", if new_value { "on" } else { "off" });
    Ok(new_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_from_kebab_case() {
        assert_eq!(
            "maintenance-mode".parse::<SettingFlag>().unwrap(),
            SettingFlag::MaintenanceMode
        );
        assert_eq!(
            "Public_Comments".parse::<SettingFlag>().unwrap(),
            SettingFlag::PublicComments
        );
        assert!(matches!(
            "dark-mode".parse::<SettingFlag>(),
            Err(Error::UnknownSetting(_))
        ));
        for flag in SettingFlag::ALL {
            assert_eq!(flag.to_string().parse::<SettingFlag>().unwrap(), flag);
        }
    }

    #[test]
    fn flags_read_settings() {
        let settings = SiteSettings::default();
        assert!(!SettingFlag::MaintenanceMode.get(&settings));
        assert!(SettingFlag::PublicComments.get(&settings));
        assert!(SettingFlag::EmailNotifications.get(&settings));
    }
}
