//! v001 -- Initial schema creation.
//!
//! Creates the `images` table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT NOT NULL,
    description   TEXT,
    category      TEXT NOT NULL,             -- category code, e.g. 'birthday'
    url           TEXT,                      -- path of the original upload
    thumbnail_url TEXT,                      -- path of the derived thumbnail
    created_at    TEXT NOT NULL,             -- RFC-3339
    updated_at    TEXT NOT NULL              -- RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
