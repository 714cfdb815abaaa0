//! Database models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// The persisted settings record.
///
/// The table holds exactly one logical row (see [`crate::settings`]); this
/// struct is its normalized shape. Wire field names are camelCase to match
/// the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Assistant tone (e.g. "Gentle", "Strict"). Stored verbatim, any
    /// string is accepted.
    pub tone: String,
    /// Webhook URL used when the primary channel fails; empty if unset.
    pub fallback_webhook: String,
    /// Webhook URL for notifications; empty if unset.
    pub notifications_webhook: String,
    /// UI theme, "dark" or "light".
    pub theme: String,
    /// Whether to hide messages during the sleep window.
    pub hide_sleeping_hours: bool,
    /// Start of the sleep window, hour of day 0-23.
    pub sleep_start_hour: i32,
    /// End of the sleep window, hour of day 0-23. May be earlier than the
    /// start hour for windows that cross midnight (e.g. 22 -> 8).
    pub sleep_end_hour: i32,
    /// Whether the chat list renders in compact mode.
    pub compact_mode: bool,
    /// Chat list density: "comfortable", "compact", or "ultra".
    pub density: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tone: "Gentle".to_string(),
            fallback_webhook: String::new(),
            notifications_webhook: String::new(),
            theme: "dark".to_string(),
            hide_sleeping_hours: false,
            sleep_start_hour: 22,
            sleep_end_hour: 8,
            compact_mode: false,
            density: "comfortable".to_string(),
        }
    }
}

/// A sparse settings patch.
///
/// Each field is optional; absent fields keep their stored value when the
/// patch is applied. Built from raw JSON with [`SettingsUpdate::from_value`]
/// rather than a strict deserialize so that wrong-typed fields degrade to
/// "absent" instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub tone: Option<String>,
    pub fallback_webhook: Option<String>,
    pub notifications_webhook: Option<String>,
    pub theme: Option<String>,
    pub hide_sleeping_hours: Option<bool>,
    pub sleep_start_hour: Option<i32>,
    pub sleep_end_hour: Option<i32>,
    pub compact_mode: Option<bool>,
    pub density: Option<String>,
}

impl SettingsUpdate {
    /// Build a patch from an arbitrary JSON value.
    ///
    /// Booleans are accepted only if the JSON value is a boolean, hours only
    /// if numeric, text fields only if strings. Anything else (including a
    /// non-object body) yields an empty patch; no input is an error.
    pub fn from_value(body: &Value) -> Self {
        Self {
            tone: string_field(body, "tone"),
            fallback_webhook: string_field(body, "fallbackWebhook"),
            notifications_webhook: string_field(body, "notificationsWebhook"),
            theme: string_field(body, "theme"),
            hide_sleeping_hours: bool_field(body, "hideSleepingHours"),
            sleep_start_hour: hour_field(body, "sleepStartHour"),
            sleep_end_hour: hour_field(body, "sleepEndHour"),
            compact_mode: bool_field(body, "compactMode"),
            density: string_field(body, "density"),
        }
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn bool_field(body: &Value, key: &str) -> Option<bool> {
    body.get(key).and_then(Value::as_bool)
}

fn hour_field(body: &Value, key: &str) -> Option<i32> {
    let value = body.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .map(|n| n as i32)
}
