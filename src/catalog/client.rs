use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::catalog::{CatalogError, MovieSource};
use crate::config::TmdbConfig;
use crate::models::{
    Genre, MovieDetails, MoviePage, MovieSummary, ProductionCompany, ProductionCountry,
    SpokenLanguage,
};

/// Poster size requested from the image CDN
const POSTER_SIZE: &str = "w500";

/// Thin typed gateway to the external movie catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: String,
}

/// Raw movie object as returned by the catalog. Serves both the list
/// and the detail endpoints; detail-only fields default to empty.
#[derive(Debug, Deserialize)]
struct MoviePayload {
    id: i64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    vote_count: Option<i64>,
    #[serde(default)]
    runtime: Option<i64>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    production_countries: Vec<ProductionCountry>,
    #[serde(default)]
    spoken_languages: Vec<SpokenLanguage>,
    #[serde(default)]
    budget: Option<i64>,
    #[serde(default)]
    revenue: Option<i64>,
}

/// Raw paginated response from the catalog
#[derive(Debug, Deserialize)]
struct PagePayload {
    page: u32,
    results: Vec<MoviePayload>,
    total_pages: i64,
    total_results: i64,
}

impl CatalogClient {
    /// Build a client from configuration. The per-request timeout is set
    /// here once; a timed-out fetch surfaces as a Network error.
    pub fn new(config: &TmdbConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            image_base_url: config.image_base_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    /// Fetch a single movie summary
    pub async fn fetch_summary(&self, id: i64) -> Result<MovieSummary, CatalogError> {
        let payload: MoviePayload = self.get_json(&format!("/movie/{}", id), &[]).await?;
        Ok(self.summary_from(payload))
    }

    /// Fetch extended details for a single movie
    pub async fn fetch_details(&self, id: i64) -> Result<MovieDetails, CatalogError> {
        let payload: MoviePayload = self.get_json(&format!("/movie/{}", id), &[]).await?;
        Ok(self.details_from(payload))
    }

    /// Search movies by title
    pub async fn search(&self, query: &str, page: u32) -> Result<MoviePage, CatalogError> {
        let payload: PagePayload = self
            .get_json(
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
            )
            .await?;
        Ok(self.page_from(payload))
    }

    /// Fetch a page of popular movies
    pub async fn popular(&self, page: u32) -> Result<MoviePage, CatalogError> {
        let payload: PagePayload = self
            .get_json("/movie/popular", &[("page", page.to_string())])
            .await?;
        Ok(self.page_from(payload))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Normalize a relative poster/backdrop path into a full image URL
    fn image_url(&self, path: Option<String>) -> Option<String> {
        path.map(|p| format!("{}/{}{}", self.image_base_url, POSTER_SIZE, p))
    }

    fn summary_from(&self, payload: MoviePayload) -> MovieSummary {
        MovieSummary {
            id: payload.id,
            title: payload.title,
            overview: payload.overview,
            poster_path: self.image_url(payload.poster_path),
            backdrop_path: payload.backdrop_path,
            release_date: payload.release_date,
            vote_average: payload.vote_average.unwrap_or(0.0),
            vote_count: payload.vote_count.unwrap_or(0),
        }
    }

    fn details_from(&self, payload: MoviePayload) -> MovieDetails {
        MovieDetails {
            id: payload.id,
            title: payload.title,
            overview: payload.overview,
            poster_path: self.image_url(payload.poster_path),
            backdrop_path: payload.backdrop_path,
            release_date: payload.release_date,
            vote_average: payload.vote_average.unwrap_or(0.0),
            vote_count: payload.vote_count.unwrap_or(0),
            runtime: payload.runtime,
            genres: payload.genres,
            production_companies: payload.production_companies,
            production_countries: payload.production_countries,
            spoken_languages: payload.spoken_languages,
            budget: payload.budget.unwrap_or(0),
            revenue: payload.revenue.unwrap_or(0),
        }
    }

    fn page_from(&self, payload: PagePayload) -> MoviePage {
        MoviePage {
            page: payload.page,
            total_pages: payload.total_pages,
            total_results: payload.total_results,
            results: payload
                .results
                .into_iter()
                .map(|m| self.summary_from(m))
                .collect(),
        }
    }
}

/// Map a non-success HTTP status to a catalog failure kind
fn classify_status(status: StatusCode) -> CatalogError {
    match status {
        StatusCode::NOT_FOUND => CatalogError::NotFound,
        StatusCode::UNAUTHORIZED => CatalogError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited,
        s => CatalogError::Api(s.as_u16()),
    }
}

#[async_trait]
impl MovieSource for CatalogClient {
    async fn movie_summary(&self, id: i64) -> Result<MovieSummary, CatalogError> {
        self.fetch_summary(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> CatalogClient {
        CatalogClient::new(&TmdbConfig {
            api_key: "test-key".to_string(),
            ..TmdbConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_poster_path_normalization() {
        let client = test_client();
        assert_eq!(
            client.image_url(Some("/poster.jpg".to_string())),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg".to_string())
        );
        assert_eq!(client.image_url(None), None);
    }

    #[test]
    fn test_summary_defaults_missing_votes_to_zero() {
        let client = test_client();
        let payload: MoviePayload = serde_json::from_value(serde_json::json!({
            "id": 550,
            "title": "Fight Club"
        }))
        .unwrap();

        let summary = client.summary_from(payload);
        assert_eq!(summary.id, 550);
        assert_eq!(summary.vote_average, 0.0);
        assert_eq!(summary.vote_count, 0);
        assert!(summary.poster_path.is_none());
    }

    #[test]
    fn test_details_mapping() {
        let client = test_client();
        let payload: MoviePayload = serde_json::from_value(serde_json::json!({
            "id": 550,
            "title": "Fight Club",
            "overview": "An insomniac office worker...",
            "poster_path": "/p.jpg",
            "release_date": "1999-10-15",
            "vote_average": 8.4,
            "vote_count": 26000,
            "runtime": 139,
            "genres": [{"id": 18, "name": "Drama"}],
            "budget": 63000000,
            "revenue": 100853753
        }))
        .unwrap();

        let details = client.details_from(payload);
        assert_eq!(details.runtime, Some(139));
        assert_eq!(details.genres.len(), 1);
        assert_eq!(details.budget, 63000000);
        assert_eq!(
            details.poster_path.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            CatalogError::NotFound
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            CatalogError::InvalidApiKey
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            CatalogError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            CatalogError::Api(500)
        ));
    }
}
