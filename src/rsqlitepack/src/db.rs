//! The database gateway: one connection, one shared read transaction, and the fixed
//! parameterized queries that pull metadata and page bytes out of each attached input.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{PackError, PackResult};
use crate::registry::RegisteredInput;
use crate::uri::readonly_uri;

/// `(page_size, page_count, journal_mode)` for one attached input.
pub struct InputMetadata {
    pub page_size: u32,
    pub page_count: u64,
    pub journal_mode: String,
}

pub struct Gateway {
    conn: Connection,
    transaction_open: bool,
}

impl Gateway {
    /// Opens an anonymous in-memory connection, in read-write mode with URI handling enabled, and
    /// sets the busy timeout so contention with writers yields retries rather than failures. The
    /// in-memory main database isolates `pragma_page_size`/`pragma_page_count` from any
    /// user-defined table an attached input happens to carry.
    pub fn open(busy_timeout: Duration) -> PackResult<Gateway> {
        let conn = Connection::open_with_flags(
            ":memory:",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Gateway {
            conn,
            transaction_open: false,
        })
    }

    /// `ATTACH DATABASE ?1 AS <alias>`. The alias is inlined textually into the SQL because the
    /// grammar requires a database-name identifier there, not a bound parameter; the path always
    /// goes through a bound text parameter as a read-only `file:` URI.
    pub fn attach(&self, input: &RegisteredInput) -> PackResult<()> {
        let sql = format!("ATTACH DATABASE ?1 AS {}", input.alias);
        let uri = readonly_uri(&input.path);
        self.conn.execute(&sql, [uri]).map_err(PackError::from)?;
        Ok(())
    }

    /// `BEGIN IMMEDIATE`, acquiring read locks on every attached database effectively
    /// simultaneously. This is the consistency anchor for the whole snapshot.
    pub fn begin(&mut self) -> PackResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.transaction_open = true;
        Ok(())
    }

    pub fn metadata(&self, alias: &str) -> PackResult<InputMetadata> {
        let sql = format!(
            "SELECT page_size, page_count, journal_mode \
             FROM main.pragma_page_size('{alias}'), main.pragma_page_count('{alias}'), \
                  main.pragma_journal_mode('{alias}')",
            alias = alias
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let (page_size, page_count, journal_mode) = stmt.query_row([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        if page_size <= 0 || page_size > 65536 {
            return Err(PackError::Inconsistent(format!(
                "unsupported page size {page_size} for alias {alias}"
            )));
        }

        Ok(InputMetadata {
            page_size: page_size as u32,
            page_count: page_count as u64,
            journal_mode,
        })
    }

    /// Streams `SELECT data FROM main.sqlite_dbpage(alias) ORDER BY pgno`, invoking `on_page` for
    /// each row in page-number order without ever materializing the full page sequence. Returns
    /// the number of pages actually seen so the caller can check it against `page_count`.
    pub fn stream_pages(
        &self,
        alias: &str,
        page_size: u32,
        mut on_page: impl FnMut(&[u8]) -> PackResult<()>,
    ) -> PackResult<u64> {
        let sql = format!(
            "SELECT data FROM main.sqlite_dbpage('{alias}') ORDER BY pgno",
            alias = alias
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut count = 0u64;
        while let Some(row) = rows.next()? {
            let data: Vec<u8> = row.get(0)?;
            if data.len() as u32 != page_size {
                return Err(PackError::Inconsistent(format!(
                    "page {count} of alias {alias} has length {}, expected {page_size}",
                    data.len()
                )));
            }
            on_page(&data)?;
            count += 1;
        }
        Ok(count)
    }

    /// Idempotent: safe to call even if no transaction is open.
    pub fn rollback(&mut self) -> PackResult<()> {
        if self.transaction_open {
            self.conn.execute_batch("ROLLBACK")?;
            self.transaction_open = false;
        }
        Ok(())
    }

    /// Idempotent: consumes the connection. `rusqlite::Connection::close` can fail and hand the
    /// connection back; in that (rare) case we just drop it, matching the teardown policy of never
    /// retrying a low-level failure.
    pub fn close(mut self) -> PackResult<()> {
        self.rollback()?;
        if let Err((conn, err)) = self.conn.close() {
            drop(conn);
            return Err(PackError::from(err));
        }
        Ok(())
    }
}

/// Re-stats the live database file (and, in WAL mode, its sidecar) to obtain the modification time
/// to embed in the archive entry. If the input is in WAL journal mode and the sidecar exists and is
/// newer, its `mtime` wins over the main file's.
pub fn resolve_mtime(path: &Path, journal_mode: &str) -> PackResult<std::time::SystemTime> {
    let main_mtime = std::fs::metadata(path)
        .map_err(|e| PackError::filesystem(path, e))?
        .modified()
        .map_err(|e| PackError::filesystem(path, e))?;

    if !journal_mode.eq_ignore_ascii_case("wal") {
        return Ok(main_mtime);
    }

    let wal_path = wal_sidecar_path(path);
    match std::fs::metadata(&wal_path).and_then(|m| m.modified()) {
        Ok(wal_mtime) if wal_mtime > main_mtime => Ok(wal_mtime),
        _ => Ok(main_mtime),
    }
}

fn wal_sidecar_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push("-wal");
    std::path::PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn touch(path: &Path, contents: &[u8], when: SystemTime) {
        std::fs::write(path, contents).unwrap();
        let file = std::fs::File::open(path).unwrap();
        file.set_modified(when).unwrap();
    }

    #[test]
    fn wal_mode_prefers_a_newer_sidecar_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("db.sqlite");
        let wal_path = dir.path().join("db.sqlite-wal");

        let earlier = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let later = earlier + Duration::from_secs(60);

        touch(&main_path, b"main", earlier);
        touch(&wal_path, b"wal", later);

        let mtime = resolve_mtime(&main_path, "wal").unwrap();
        assert_eq!(mtime, later);
    }

    #[test]
    fn wal_mode_keeps_main_mtime_when_sidecar_is_older() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("db.sqlite");
        let wal_path = dir.path().join("db.sqlite-wal");

        let later = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let earlier = later - Duration::from_secs(60);

        touch(&main_path, b"main", later);
        touch(&wal_path, b"wal", earlier);

        let mtime = resolve_mtime(&main_path, "wal").unwrap();
        assert_eq!(mtime, later);
    }

    #[test]
    fn non_wal_journal_mode_ignores_a_stray_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("db.sqlite");
        let wal_path = dir.path().join("db.sqlite-wal");

        let main_time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let wal_time = main_time + Duration::from_secs(3600);

        touch(&main_path, b"main", main_time);
        touch(&wal_path, b"wal", wal_time);

        for mode in ["delete", "DELETE", "truncate", "persist", "memory", "off"] {
            let mtime = resolve_mtime(&main_path, mode).unwrap();
            assert_eq!(mtime, main_time, "journal_mode {mode} must ignore the sidecar");
        }
    }

    #[test]
    fn close_runs_and_succeeds_on_a_freshly_opened_gateway() {
        let gateway = Gateway::open(Duration::from_millis(100)).unwrap();
        gateway.close().unwrap();
    }

    #[test]
    fn close_rolls_back_an_open_transaction_before_closing() {
        let mut gateway = Gateway::open(Duration::from_millis(100)).unwrap();
        gateway.begin().unwrap();
        gateway.close().unwrap();
    }
}
