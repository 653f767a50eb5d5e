use rusqlite::Connection;

// The gallery feed filters by category on every request.
const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_images_category ON images(category, id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
