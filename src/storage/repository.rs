use rusqlite::{params, Connection, OptionalExtension};

use crate::settings::{Settings, ACCESS_TOKEN_KEY, BASE_URL_KEY};

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn unset_config(conn: &Connection, key: &str) -> Result<bool, rusqlite::Error> {
    let count = conn.execute("DELETE FROM app_config WHERE key = ?1", params![key])?;
    Ok(count > 0)
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── User Preferences ───────────────────────────────────────────────

pub fn get_preference(
    conn: &Connection,
    user: &str,
    name: &str,
) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM user_preferences WHERE user_name = ?1 AND name = ?2",
        params![user, name],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_preference(
    conn: &Connection,
    user: &str,
    name: &str,
    value: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO user_preferences (user_name, name, value, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))",
        params![user, name, value],
    )?;
    Ok(())
}

pub fn remove_preference(
    conn: &Connection,
    user: &str,
    name: &str,
) -> Result<bool, rusqlite::Error> {
    let count = conn.execute(
        "DELETE FROM user_preferences WHERE user_name = ?1 AND name = ?2",
        params![user, name],
    )?;
    Ok(count > 0)
}

/// Users that have a preference `name` set, in name order.
pub fn users_with_preference(
    conn: &Connection,
    name: &str,
) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT user_name FROM user_preferences WHERE name = ?1 ORDER BY user_name",
    )?;
    let rows = stmt.query_map(params![name], |row| row.get(0))?;
    rows.collect()
}

// ── Settings snapshot ──────────────────────────────────────────────

/// Read the GitLab base URL and every user's access token.
pub fn load_settings(conn: &Connection) -> Result<Settings, rusqlite::Error> {
    let base_url = get_config(conn, BASE_URL_KEY)?;

    let mut stmt =
        conn.prepare("SELECT user_name, value FROM user_preferences WHERE name = ?1")?;
    let tokens = stmt
        .query_map(params![ACCESS_TOKEN_KEY], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    Ok(Settings { base_url, tokens })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsProvider;
    use crate::storage::Database;

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                set_config(conn, BASE_URL_KEY, "https://gl.example.com")?;
                let val = get_config(conn, BASE_URL_KEY)?;
                assert_eq!(val, Some("https://gl.example.com".to_string()));

                let missing = get_config(conn, "nonexistent")?;
                assert_eq!(missing, None);

                assert!(unset_config(conn, BASE_URL_KEY)?);
                assert!(!unset_config(conn, BASE_URL_KEY)?);
                assert_eq!(get_config(conn, BASE_URL_KEY)?, None);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_config_sorted() {
        let db = Database::open_memory().await.unwrap();

        let items = db
            .writer()
            .call(|conn| {
                set_config(conn, "zeta", "1")?;
                set_config(conn, "alpha", "2")?;
                set_config(conn, "alpha", "3")?;
                list_config(conn)
            })
            .await
            .unwrap();
        assert_eq!(
            items,
            vec![
                ("alpha".to_string(), "3".to_string()),
                ("zeta".to_string(), "1".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_preference_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                set_preference(conn, "jane", ACCESS_TOKEN_KEY, "glpat-1")?;
                set_preference(conn, "john", ACCESS_TOKEN_KEY, "glpat-2")?;
                set_preference(conn, "jane", "theme", "dark")?;

                assert_eq!(
                    get_preference(conn, "jane", ACCESS_TOKEN_KEY)?,
                    Some("glpat-1".to_string())
                );
                assert_eq!(
                    users_with_preference(conn, ACCESS_TOKEN_KEY)?,
                    vec!["jane".to_string(), "john".to_string()]
                );

                assert!(remove_preference(conn, "john", ACCESS_TOKEN_KEY)?);
                assert_eq!(get_preference(conn, "john", ACCESS_TOKEN_KEY)?, None);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_settings() {
        let db = Database::open_memory().await.unwrap();

        let settings = db
            .writer()
            .call(|conn| {
                set_config(conn, BASE_URL_KEY, "https://gl.example.com")?;
                set_preference(conn, "jane", ACCESS_TOKEN_KEY, "glpat-1")?;
                set_preference(conn, "john", "theme", "dark")?;
                load_settings(conn)
            })
            .await
            .unwrap();

        assert_eq!(settings.base_url().as_deref(), Some("https://gl.example.com"));
        assert_eq!(settings.access_token("jane").as_deref(), Some("glpat-1"));
        assert_eq!(settings.access_token("john"), None);
    }

    #[tokio::test]
    async fn test_load_settings_empty() {
        let db = Database::open_memory().await.unwrap();
        let settings = db.reader().call(|conn| load_settings(conn)).await.unwrap();
        assert_eq!(settings.base_url(), None);
        assert!(settings.tokens.is_empty());
    }
}
