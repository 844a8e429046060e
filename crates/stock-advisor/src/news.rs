//! Recent headlines for a company

use crate::api::{Article, NewsApiClient};
use crate::error::{AdvisorError, Result};
use std::fmt;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub source: String,
}

impl From<Article> for Headline {
    fn from(article: Article) -> Self {
        Self {
            title: article.title.unwrap_or_else(|| "Untitled".to_string()),
            source: article.source.name.unwrap_or_else(|| "unknown source".to_string()),
        }
    }
}

impl fmt::Display for Headline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.source)
    }
}

/// Newest-first headlines about one company
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsBundle {
    pub company: String,
    pub headlines: Vec<Headline>,
}

impl fmt::Display for NewsBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recent news on {}:", self.company)?;
        for headline in &self.headlines {
            write!(f, "\n{headline}")?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct NewsFetcher {
    client: NewsApiClient,
    page_size: u32,
}

impl NewsFetcher {
    pub fn new(client: NewsApiClient, page_size: u32) -> Self {
        Self { client, page_size }
    }

    #[instrument(skip(self))]
    pub async fn fetch_news(&self, company: &str) -> Result<NewsBundle> {
        let company = company.trim();
        if company.is_empty() {
            return Err(AdvisorError::Validation(
                "Company name must be a non-empty string.".to_string(),
            ));
        }
        if !self.client.has_api_key() {
            return Err(AdvisorError::Config("NewsAPI key not set.".to_string()));
        }

        let articles = self.client.everything(company, self.page_size).await?;
        if articles.is_empty() {
            info!("no recent articles");
            return Err(AdvisorError::NotFound(format!(
                "No recent articles found for {company}."
            )));
        }

        let headlines: Vec<Headline> = articles
            .into_iter()
            .take(self.page_size as usize)
            .map(Headline::from)
            .collect();
        info!(headlines = headlines.len(), "news fetched");

        Ok(NewsBundle {
            company: company.to_string(),
            headlines,
        })
    }
}
