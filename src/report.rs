//! Popularity and error-rate reports over the news access log

use chrono::NaiveDate;
use std::io::Write;
use tracing::{debug, error};

use crate::config::ReportConfig;
use crate::db::{schema, Session};
use crate::error::{ReportError, Stage};

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleStat {
    pub title: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorStat {
    pub name: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadDay {
    pub day: NaiveDate,
    pub error_percent: f64,
}

/// Runs the reports over a borrowed session
pub struct Reporter<'s> {
    session: &'s mut Session,
    settings: ReportConfig,
}

impl<'s> Reporter<'s> {
    pub fn new(session: &'s mut Session, settings: ReportConfig) -> Self {
        Self { session, settings }
    }

    /// Most requested articles, highest count first
    pub async fn top_articles(&mut self) -> Result<Vec<ArticleStat>, ReportError> {
        let limit = self.settings.top_articles;
        let conn = self.session.connection()?;
        let rows: Vec<(String, i64)> = sqlx::query_as(schema::TOP_ARTICLES)
            .bind(limit)
            .fetch_all(conn)
            .await
            .map_err(|e| ReportError::classify(Stage::Query, e))?;

        debug!("Fetched {} article rows", rows.len());
        Ok(rows
            .into_iter()
            .map(|(title, views)| ArticleStat { title, views })
            .collect())
    }

    /// Total requests across each author's articles, highest first
    pub async fn top_authors(&mut self) -> Result<Vec<AuthorStat>, ReportError> {
        let conn = self.session.connection()?;
        let rows: Vec<(String, i64)> = sqlx::query_as(schema::TOP_AUTHORS)
            .fetch_all(conn)
            .await
            .map_err(|e| ReportError::classify(Stage::Query, e))?;

        debug!("Fetched {} author rows", rows.len());
        Ok(rows
            .into_iter()
            .map(|(name, views)| AuthorStat { name, views })
            .collect())
    }

    /// Days whose error share is above the configured threshold
    pub async fn bad_days(&mut self) -> Result<Vec<BadDay>, ReportError> {
        let threshold = self.settings.error_threshold_percent;
        let conn = self.session.connection()?;
        let rows: Vec<(NaiveDate, f64)> = sqlx::query_as(schema::BAD_DAYS)
            .bind(threshold)
            .fetch_all(conn)
            .await
            .map_err(|e| ReportError::classify(Stage::Query, e))?;

        debug!("Fetched {} bad day rows", rows.len());
        Ok(rows
            .into_iter()
            .map(|(day, error_percent)| BadDay { day, error_percent })
            .collect())
    }

    pub async fn print_top_articles<W: Write>(&mut self, out: &mut W) -> Result<(), ReportError> {
        let articles = self.top_articles().await?;
        let text = render_articles(self.settings.top_articles, &articles).map_err(log_no_data)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    pub async fn print_top_authors<W: Write>(&mut self, out: &mut W) -> Result<(), ReportError> {
        let authors = self.top_authors().await?;
        let text = render_authors(&authors).map_err(log_no_data)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    pub async fn print_bad_days<W: Write>(&mut self, out: &mut W) -> Result<(), ReportError> {
        let days = self.bad_days().await?;
        let text = render_bad_days(&days).map_err(log_no_data)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Articles, then authors, then bad days. Stops at the first failure.
    pub async fn print_all<W: Write>(&mut self, out: &mut W) -> Result<(), ReportError> {
        debug!("Running reports against {}", self.session.name());
        self.print_top_articles(out).await?;
        self.print_top_authors(out).await?;
        self.print_bad_days(out).await?;
        out.flush()?;
        Ok(())
    }
}

fn log_no_data(err: ReportError) -> ReportError {
    error!("{}", err);
    err
}

/// Surround a header with a line of stars above and below.
pub fn banner(message: &str) -> String {
    let stars = "*".repeat(message.chars().count());
    format!("\n{stars}\n{message}\n{stars}\n")
}

pub fn render_articles(limit: i64, articles: &[ArticleStat]) -> Result<String, ReportError> {
    if articles.is_empty() {
        return Err(ReportError::NoData("No article data to display!"));
    }

    let mut text = banner(&format!("The {} most popular articles of all time are:", limit));
    text.push('\n');
    for article in articles {
        text.push_str(&format!("\"{}\" - {} views\n", article.title, article.views));
    }
    Ok(text)
}

pub fn render_authors(authors: &[AuthorStat]) -> Result<String, ReportError> {
    if authors.is_empty() {
        return Err(ReportError::NoData("No author data to display!"));
    }

    let mut text = banner("The most popular authors of all time are:");
    text.push('\n');
    for author in authors {
        text.push_str(&format!("\"{}\" - {} views\n", author.name, author.views));
    }
    Ok(text)
}

pub fn render_bad_days(days: &[BadDay]) -> Result<String, ReportError> {
    if days.is_empty() {
        return Err(ReportError::NoData("No bad days data to display!"));
    }

    let mut text = banner("Bad days are:");
    text.push('\n');
    for day in days {
        // e.g. "July 29, 2016" - 2.5% errors
        text.push_str(&format!(
            "\"{}\" - {:.1}% errors\n",
            day.day.format("%B %d, %Y"),
            day.error_percent
        ));
    }
    Ok(text)
}
