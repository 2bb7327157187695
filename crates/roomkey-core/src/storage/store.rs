use crate::fingerprint::hash_selections;
use crate::model::{CachedRender, RenderJob};
use anyhow::Context;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Placeholder asset path marking a render claim. Replaced by the real
/// asset path on completion; lookup never returns it.
pub const PENDING_ASSET: &str = "__pending__";

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller owns generation for the key.
    Claimed,
    /// Another request holds a live claim for the same key.
    InProgress,
}

pub struct StoreStats {
    pub renders: Option<u64>,
    pub pending: Option<u64>,
    pub last_created_at: Option<String>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn =
            Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;

        // v0.2 additions for DBs created before policy keys existed.
        let cols = get_columns(&conn, "renders")?;
        add_column_if_missing(&conn, &cols, "renders", "policy_key", "TEXT")?;
        add_column_if_missing(&conn, &cols, "renders", "selections_fingerprint", "TEXT")?;

        Ok(())
    }

    /// Completed render for a cache key, if any. Claim placeholders do not
    /// count as hits.
    pub fn get_render(&self, cache_key: &str) -> anyhow::Result<Option<CachedRender>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT cache_key, asset_path, model, cache_version, photo_id, created_at
             FROM renders
             WHERE cache_key = ?1 AND asset_path != ?2",
        )?;
        let mut rows = stmt.query(params![cache_key, PENDING_ASSET])?;

        if let Some(row) = rows.next()? {
            Ok(Some(CachedRender {
                cache_key: row.get(0)?,
                asset_path: row.get(1)?,
                model: row.get(2)?,
                cache_version: row.get(3)?,
                photo_id: row.get(4)?,
                created_at: row.get(5)?,
            }))
        } else {
            Ok(None)
        }
    }

    /// Claims generation for a job by inserting a placeholder row. A primary
    /// key conflict means a cached result or a live claim already exists;
    /// reported as `InProgress`, not an error, so concurrent requests for the
    /// same key converge on one generation. Stale claims are purged first so
    /// a crashed generator cannot block a key forever.
    pub fn claim(&self, job: &RenderJob, stale_after_secs: i64) -> anyhow::Result<ClaimOutcome> {
        self.purge_stale_claims(stale_after_secs)?;

        let conn = self.conn.lock().unwrap();
        let created_at = chrono::Utc::now().to_rfc3339();
        let selections_json = serde_json::to_string(&job.effective_selections)?;

        let inserted = conn.execute(
            "INSERT INTO renders(
                cache_key, asset_path, selections_json, selections_fingerprint,
                model, cache_version, photo_id, policy_key, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.cache_key,
                PENDING_ASSET,
                selections_json,
                hash_selections(&job.effective_selections),
                job.model,
                job.cache_version,
                photo_id_of(job),
                job.policy_key,
                created_at
            ],
        );

        match inserted {
            Ok(_) => Ok(ClaimOutcome::Claimed),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(ClaimOutcome::InProgress)
            }
            Err(e) => Err(e).context("failed to claim render slot"),
        }
    }

    /// Removes a claim placeholder so retries can proceed after a failed
    /// generation. Completed entries are untouched.
    pub fn release(&self, cache_key: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM renders WHERE cache_key = ?1 AND asset_path = ?2",
            params![cache_key, PENDING_ASSET],
        )?;
        Ok(())
    }

    /// Records the finished render under the exact key the claim was taken
    /// for. Upsert so the placeholder row is replaced and a lost race with
    /// another completer is harmless (same key implies same content).
    pub fn complete(&self, job: &RenderJob, asset_path: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let created_at = chrono::Utc::now().to_rfc3339();
        let selections_json = serde_json::to_string(&job.effective_selections)?;

        conn.execute(
            "INSERT INTO renders(
                cache_key, asset_path, selections_json, selections_fingerprint,
                model, cache_version, photo_id, policy_key, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(cache_key) DO UPDATE SET
                asset_path=excluded.asset_path,
                selections_json=excluded.selections_json,
                selections_fingerprint=excluded.selections_fingerprint,
                created_at=excluded.created_at",
            params![
                job.cache_key,
                asset_path,
                selections_json,
                hash_selections(&job.effective_selections),
                job.model,
                job.cache_version,
                photo_id_of(job),
                job.policy_key,
                created_at
            ],
        )?;
        Ok(())
    }

    /// Deletes the completed entry for a key so the next request regenerates
    /// (operator retry for a bad render). Live claims are left alone.
    pub fn invalidate(&self, cache_key: &str) -> anyhow::Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM renders WHERE cache_key = ?1 AND asset_path != ?2",
            params![cache_key, PENDING_ASSET],
        )?;
        Ok(n)
    }

    /// Deletes claim placeholders older than the threshold. RFC3339 UTC
    /// timestamps compare correctly as strings.
    pub fn purge_stale_claims(&self, stale_after_secs: i64) -> anyhow::Result<usize> {
        let threshold =
            (chrono::Utc::now() - chrono::Duration::seconds(stale_after_secs)).to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let purged = conn.execute(
            "DELETE FROM renders WHERE asset_path = ?1 AND created_at < ?2",
            params![PENDING_ASSET, threshold],
        )?;
        if purged > 0 {
            tracing::warn!(purged, "purged stale render claims");
        }
        Ok(purged)
    }

    pub fn stats_best_effort(&self) -> anyhow::Result<StoreStats> {
        let conn = self.conn.lock().unwrap();

        let renders: Option<u64> = conn
            .query_row(
                "SELECT COUNT(*) FROM renders WHERE asset_path != ?1",
                params![PENDING_ASSET],
                |r| r.get::<_, i64>(0).map(|x| x as u64),
            )
            .ok();
        let pending: Option<u64> = conn
            .query_row(
                "SELECT COUNT(*) FROM renders WHERE asset_path = ?1",
                params![PENDING_ASSET],
                |r| r.get::<_, i64>(0).map(|x| x as u64),
            )
            .ok();
        let last_created_at: Option<String> = conn
            .query_row(
                "SELECT created_at FROM renders ORDER BY created_at DESC LIMIT 1",
                [],
                |r| r.get(0),
            )
            .ok();

        Ok(StoreStats {
            renders,
            pending,
            last_created_at,
        })
    }
}

fn photo_id_of(job: &RenderJob) -> Option<&str> {
    if job.photo.photo_id.is_empty() {
        None
    } else {
        Some(job.photo.photo_id.as_str())
    }
}

fn get_columns(
    conn: &Connection,
    table: &str,
) -> anyhow::Result<std::collections::HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut out = std::collections::HashSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}

fn add_column_if_missing(
    conn: &Connection,
    cols: &std::collections::HashSet<String>,
    table: &str,
    col: &str,
    ty: &str,
) -> anyhow::Result<()> {
    if !cols.contains(col) {
        let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, col, ty);
        conn.execute(&sql, [])?;
    }
    Ok(())
}
