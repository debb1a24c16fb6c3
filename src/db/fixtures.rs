//! In-memory news database for tests

use sqlx::{Connection, SqliteConnection};

use super::Session;

const CREATE_AUTHORS: &str = r#"
CREATE TABLE authors (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
)
"#;

const CREATE_ARTICLES: &str = r#"
CREATE TABLE articles (
    slug TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author INTEGER NOT NULL REFERENCES authors(id)
)
"#;

const CREATE_LOG: &str = r#"
CREATE TABLE log (
    path TEXT,
    status TEXT,
    time TEXT
)
"#;

// Inserts `n` identical log rows without a round trip per row
const INSERT_LOG_ROWS: &str = r#"
WITH RECURSIVE seq(n) AS (
    SELECT 1
    UNION ALL
    SELECT n + 1 FROM seq WHERE n < ?
)
INSERT INTO log (path, status, time)
SELECT ?, ?, ? FROM seq
"#;

pub struct Fixture {
    conn: SqliteConnection,
}

impl Fixture {
    pub async fn new() -> Self {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        for ddl in [CREATE_AUTHORS, CREATE_ARTICLES, CREATE_LOG] {
            sqlx::query(ddl).execute(&mut conn).await.unwrap();
        }
        Self { conn }
    }

    pub async fn author(mut self, id: i64, name: &str) -> Self {
        sqlx::query("INSERT INTO authors (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut self.conn)
            .await
            .unwrap();
        self
    }

    pub async fn article(mut self, slug: &str, title: &str, author: i64) -> Self {
        sqlx::query("INSERT INTO articles (slug, title, author) VALUES (?, ?, ?)")
            .bind(slug)
            .bind(title)
            .bind(author)
            .execute(&mut self.conn)
            .await
            .unwrap();
        self
    }

    /// Adds `count` requests for `path` with the given status at `time`
    pub async fn hits(mut self, path: &str, status: &str, time: &str, count: i64) -> Self {
        if count == 0 {
            return self;
        }
        sqlx::query(INSERT_LOG_ROWS)
            .bind(count)
            .bind(path)
            .bind(status)
            .bind(time)
            .execute(&mut self.conn)
            .await
            .unwrap();
        self
    }

    pub async fn session(self) -> Session {
        Session::attach("memory", self.conn).await.unwrap()
    }
}
