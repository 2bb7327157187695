pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS renders (
  cache_key TEXT PRIMARY KEY,
  asset_path TEXT NOT NULL,
  selections_json TEXT NOT NULL,
  selections_fingerprint TEXT,
  model TEXT NOT NULL,
  cache_version TEXT NOT NULL,
  photo_id TEXT,
  policy_key TEXT,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_renders_photo ON renders(photo_id);
"#;
