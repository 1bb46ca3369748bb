//! SQLite job store implementation

use crate::store::schema::{
    initialize_schema, KIND_ALL_URLS, KIND_COMPLETED, KIND_IMAGES, KIND_PENDING,
};
use crate::store::{Job, JobStore, StoreError, StoreResult};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// SQLite-backed job store
///
/// WAL mode lets the API process and the workers on a host share one
/// database file; each trait operation is a single transaction, so the
/// per-call atomicity the store contract promises comes straight from
/// SQLite.
pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Opens (or creates) a job store database at the given path
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store, primarily for tests
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl JobStore for SqliteJobStore {
    fn create_job(&mut self, urls: &HashSet<String>) -> StoreResult<Job> {
        if urls.is_empty() {
            return Err(StoreError::NoUrls);
        }

        let job_id = Uuid::new_v4().to_string();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO job_members (job_id, kind, member) VALUES (?1, ?2, ?3)",
            )?;
            for url in urls {
                stmt.execute(params![job_id, KIND_ALL_URLS, url])?;
                stmt.execute(params![job_id, KIND_PENDING, url])?;
            }
        }
        tx.commit()?;

        self.get_job(&job_id)
    }

    fn get_job(&self, job_id: &str) -> StoreResult<Job> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, member FROM job_members WHERE job_id = ?1")?;

        let mut all_urls = HashSet::new();
        let mut crawls_pending = HashSet::new();
        let mut crawls_completed = HashSet::new();
        let mut images = HashSet::new();

        let rows = stmt.query_map(params![job_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (kind, member) = row?;
            match kind.as_str() {
                KIND_ALL_URLS => {
                    all_urls.insert(member);
                }
                KIND_PENDING => {
                    crawls_pending.insert(member);
                }
                KIND_COMPLETED => {
                    crawls_completed.insert(member);
                }
                KIND_IMAGES => {
                    images.insert(member);
                }
                _ => {}
            }
        }

        // all_urls always has at least one entry for a job that exists.
        if all_urls.is_empty() {
            return Err(StoreError::UnknownJob(job_id.to_string()));
        }

        Ok(Job {
            id: job_id.to_string(),
            all_urls,
            crawls_pending,
            crawls_completed,
            images,
        })
    }

    fn record_crawl_result(
        &mut self,
        job_id: &str,
        url: &str,
        images: &HashSet<String>,
    ) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM job_members WHERE job_id = ?1 AND kind = ?2 AND member = ?3",
            params![job_id, KIND_PENDING, url],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO job_members (job_id, kind, member) VALUES (?1, ?2, ?3)",
            params![job_id, KIND_COMPLETED, url],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO job_members (job_id, kind, member) VALUES (?1, ?2, ?3)",
            )?;
            for image in images {
                stmt.execute(params![job_id, KIND_IMAGES, image])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_set(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_create_job_rejects_empty_url_set() {
        let mut store = SqliteJobStore::open_in_memory().unwrap();
        let result = store.create_job(&HashSet::new());
        assert!(matches!(result, Err(StoreError::NoUrls)));
    }

    #[test]
    fn test_create_job_initializes_all_four_sets() {
        let mut store = SqliteJobStore::open_in_memory().unwrap();
        let urls = url_set(&["http://a.com", "http://b.com"]);

        let job = store.create_job(&urls).unwrap();

        assert!(!job.id.is_empty());
        assert_eq!(job.all_urls, urls);
        assert_eq!(job.crawls_pending, urls);
        assert!(job.crawls_completed.is_empty());
        assert!(job.images.is_empty());
    }

    #[test]
    fn test_get_job_unknown_id_fails() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let result = store.get_job("no-such-job");
        assert!(matches!(result, Err(StoreError::UnknownJob(_))));
    }

    #[test]
    fn test_record_crawl_result_moves_url_and_unions_images() {
        let mut store = SqliteJobStore::open_in_memory().unwrap();
        let job = store
            .create_job(&url_set(&["http://a.com", "http://b.com"]))
            .unwrap();

        let images = url_set(&["http://a.com/1.png", "http://a.com/2.png"]);
        store
            .record_crawl_result(&job.id, "http://a.com", &images)
            .unwrap();

        let job = store.get_job(&job.id).unwrap();
        assert_eq!(job.crawls_pending, url_set(&["http://b.com"]));
        assert_eq!(job.crawls_completed, url_set(&["http://a.com"]));
        assert_eq!(job.images, images);
        // The initial scope never changes.
        assert_eq!(job.all_urls, url_set(&["http://a.com", "http://b.com"]));
    }

    #[test]
    fn test_record_crawl_result_is_idempotent() {
        let mut store = SqliteJobStore::open_in_memory().unwrap();
        let job = store.create_job(&url_set(&["http://a.com"])).unwrap();

        let images = url_set(&["http://a.com/1.png"]);
        store
            .record_crawl_result(&job.id, "http://a.com", &images)
            .unwrap();
        let first = store.get_job(&job.id).unwrap();

        store
            .record_crawl_result(&job.id, "http://a.com", &images)
            .unwrap();
        let second = store.get_job(&job.id).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_record_crawl_result_with_no_images() {
        let mut store = SqliteJobStore::open_in_memory().unwrap();
        let job = store.create_job(&url_set(&["http://a.com"])).unwrap();

        store
            .record_crawl_result(&job.id, "http://a.com", &HashSet::new())
            .unwrap();

        let job = store.get_job(&job.id).unwrap();
        assert!(job.crawls_pending.is_empty());
        assert_eq!(job.crawls_completed, url_set(&["http://a.com"]));
        assert!(job.images.is_empty());
    }

    #[test]
    fn test_jobs_do_not_bleed_into_each_other() {
        let mut store = SqliteJobStore::open_in_memory().unwrap();
        let first = store.create_job(&url_set(&["http://a.com"])).unwrap();
        let second = store.create_job(&url_set(&["http://b.com"])).unwrap();

        store
            .record_crawl_result(&first.id, "http://a.com", &url_set(&["http://a.com/1.png"]))
            .unwrap();

        let second = store.get_job(&second.id).unwrap();
        assert_eq!(second.crawls_pending, url_set(&["http://b.com"]));
        assert!(second.images.is_empty());
    }
}
