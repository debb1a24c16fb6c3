//! SQL statements issued by a report run

// Turns the connection into a read-only cursor for the rest of the session
pub const QUERY_ONLY: &str = "PRAGMA query_only = ON";

// Requests per article, most viewed first. Bind: row limit
pub const TOP_ARTICLES: &str = r#"
SELECT articles.title, path_counts.views
FROM articles
JOIN (
    SELECT path, COUNT(path) AS views
    FROM log
    WHERE path LIKE '/article/%'
    GROUP BY path
) AS path_counts
ON path_counts.path = '/article/' || articles.slug
ORDER BY path_counts.views DESC
LIMIT ?
"#;

// Requests summed over each author's articles, most viewed first
pub const TOP_AUTHORS: &str = r#"
SELECT authors.name, author_views.views
FROM (
    SELECT articles.author AS author, SUM(path_counts.views) AS views
    FROM articles
    JOIN (
        SELECT path, COUNT(path) AS views
        FROM log
        WHERE path LIKE '/article/%'
        GROUP BY path
    ) AS path_counts
    ON path_counts.path = '/article/' || articles.slug
    GROUP BY articles.author
) AS author_views
JOIN authors ON author_views.author = authors.id
ORDER BY author_views.views DESC
"#;

// Days whose error share is above the threshold. Bind: threshold percent.
// An error is anything that is not "200 OK" and sits in the 4xx or 5xx class.
// Days without errors get a NULL percent and drop out of the filter.
// The offset is cut before bucketing: date() rejects short offsets like "+00".
pub const BAD_DAYS: &str = r#"
SELECT day, percent
FROM (
    SELECT
        totals.day AS day,
        (CAST(errors.errs AS REAL) / totals.total) * 100.0 AS percent
    FROM (
        SELECT date(substr(time, 1, 19)) AS day, COUNT(1) AS total
        FROM log
        GROUP BY day
    ) AS totals
    LEFT JOIN (
        SELECT date(substr(time, 1, 19)) AS day, COUNT(1) AS errs
        FROM log
        WHERE status != '200 OK'
          AND (
              -- client error
              status LIKE '4%' OR
              -- server error
              status LIKE '5%'
          )
        GROUP BY day
    ) AS errors
    ON totals.day = errors.day
) AS daily
WHERE percent > ?
ORDER BY day
"#;
