//! Job store schema definition

use rusqlite::Connection;

/// Kind tag for a job's full initial URL scope
pub const KIND_ALL_URLS: &str = "all_urls";

/// Kind tag for URLs registered but not yet crawled
pub const KIND_PENDING: &str = "crawls_pending";

/// Kind tag for URLs that finished crawling
pub const KIND_COMPLETED: &str = "crawls_completed";

/// Kind tag for discovered image URLs
pub const KIND_IMAGES: &str = "images";

/// Initializes the job store schema
///
/// One table holds every job: each row is one member of one of the four
/// set-valued entries a job is comprised of, discriminated by `kind`. The
/// primary key gives set semantics (`INSERT OR IGNORE` deduplicates).
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS job_members (
            job_id TEXT NOT NULL,
            kind   TEXT NOT NULL,
            member TEXT NOT NULL,
            PRIMARY KEY (job_id, kind, member)
        );

        CREATE INDEX IF NOT EXISTS idx_job_members_job ON job_members (job_id);
    ",
    )?;

    Ok(())
}
