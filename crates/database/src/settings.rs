//! Singleton settings storage.
//!
//! One table, one logical row, keyed by [`SINGLETON_ID`]. The schema is
//! ensured before every read and write: create the table if absent, apply
//! the additive column migrations, and materialize the singleton row.

use sqlx::PgPool;

use crate::models::{Settings, SettingsUpdate};
use crate::Result;

/// Fixed primary key of the settings row.
pub const SINGLETON_ID: &str = "singleton";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    id TEXT PRIMARY KEY,
    tone TEXT NOT NULL DEFAULT 'Gentle',
    fallback_webhook TEXT NOT NULL DEFAULT '',
    notifications_webhook TEXT NOT NULL DEFAULT '',
    theme TEXT NOT NULL DEFAULT 'dark',
    hide_sleeping_hours BOOLEAN NOT NULL DEFAULT false,
    sleep_start_hour INTEGER NOT NULL DEFAULT 22,
    sleep_end_hour INTEGER NOT NULL DEFAULT 8,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    compact_mode BOOLEAN NOT NULL DEFAULT false,
    density TEXT NOT NULL DEFAULT 'comfortable'
)
"#;

/// Columns introduced after the original schema, one idempotent statement
/// each so deployments created before a column existed pick it up without
/// data loss. No column depends on another's presence.
const ADDITIVE_MIGRATIONS: &[&str] = &[
    "ALTER TABLE settings ADD COLUMN IF NOT EXISTS notifications_webhook TEXT NOT NULL DEFAULT ''",
    "ALTER TABLE settings ADD COLUMN IF NOT EXISTS hide_sleeping_hours BOOLEAN NOT NULL DEFAULT false",
    "ALTER TABLE settings ADD COLUMN IF NOT EXISTS sleep_start_hour INTEGER NOT NULL DEFAULT 22",
    "ALTER TABLE settings ADD COLUMN IF NOT EXISTS sleep_end_hour INTEGER NOT NULL DEFAULT 8",
    "ALTER TABLE settings ADD COLUMN IF NOT EXISTS compact_mode BOOLEAN NOT NULL DEFAULT false",
    "ALTER TABLE settings ADD COLUMN IF NOT EXISTS density TEXT NOT NULL DEFAULT 'comfortable'",
];

/// Ensure the table, its late-added columns, and the singleton row exist.
///
/// Safe to call on every request; every statement is idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_TABLE).execute(pool).await?;

    for statement in ADDITIVE_MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }

    sqlx::query(
        r#"
        INSERT INTO settings (id) VALUES ($1)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(SINGLETON_ID)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read the settings row.
///
/// A missing row (fresh store, or a race with creation) yields the default
/// record rather than an error.
pub async fn get(pool: &PgPool) -> Result<Settings> {
    ensure_schema(pool).await?;

    let record = sqlx::query_as::<_, Settings>(
        r#"
        SELECT tone, fallback_webhook, notifications_webhook, theme,
               hide_sleeping_hours, sleep_start_hour, sleep_end_hour,
               compact_mode, density
        FROM settings
        WHERE id = $1
        "#,
    )
    .bind(SINGLETON_ID)
    .fetch_optional(pool)
    .await?;

    Ok(record.unwrap_or_default())
}

/// Apply a sparse patch to the settings row in a single round trip.
///
/// Absent fields bind as NULL, so COALESCE keeps the stored value on
/// conflict and falls back to the column default on first insert. The
/// updated timestamp refreshes on every write, whether or not any visible
/// field changed. Callers re-fetch to observe the merged state.
pub async fn upsert(pool: &PgPool, update: &SettingsUpdate) -> Result<()> {
    ensure_schema(pool).await?;

    sqlx::query(
        r#"
        INSERT INTO settings (id, tone, fallback_webhook, notifications_webhook, theme,
                              hide_sleeping_hours, sleep_start_hour, sleep_end_hour,
                              compact_mode, density)
        VALUES ($1,
                COALESCE($2, 'Gentle'),
                COALESCE($3, ''),
                COALESCE($4, ''),
                COALESCE($5, 'dark'),
                COALESCE($6, false),
                COALESCE($7, 22),
                COALESCE($8, 8),
                COALESCE($9, false),
                COALESCE($10, 'comfortable'))
        ON CONFLICT (id) DO UPDATE SET
            tone = COALESCE($2, settings.tone),
            fallback_webhook = COALESCE($3, settings.fallback_webhook),
            notifications_webhook = COALESCE($4, settings.notifications_webhook),
            theme = COALESCE($5, settings.theme),
            hide_sleeping_hours = COALESCE($6, settings.hide_sleeping_hours),
            sleep_start_hour = COALESCE($7, settings.sleep_start_hour),
            sleep_end_hour = COALESCE($8, settings.sleep_end_hour),
            compact_mode = COALESCE($9, settings.compact_mode),
            density = COALESCE($10, settings.density),
            updated_at = NOW()
        "#,
    )
    .bind(SINGLETON_ID)
    .bind(update.tone.as_deref())
    .bind(update.fallback_webhook.as_deref())
    .bind(update.notifications_webhook.as_deref())
    .bind(update.theme.as_deref())
    .bind(update.hide_sleeping_hours)
    .bind(update.sleep_start_hour)
    .bind(update.sleep_end_hour)
    .bind(update.compact_mode)
    .bind(update.density.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}
