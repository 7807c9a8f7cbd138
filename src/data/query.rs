use super::earthquake::{from_rows, Earthquake, QueryRow};
use crate::core::constants::QUERY_ROW_LIMIT;
#[cfg(feature = "http")]
use crate::{QuakeError, Result};

/// Request for one catalogue from the dataset query endpoint.
///
/// The endpoint answers the newest `limit` rows, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetQuery {
    pub endpoint: String,
    pub dataset: Option<String>,
    pub limit: usize,
}

impl DatasetQuery {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            dataset: None,
            limit: QUERY_ROW_LIMIT,
        }
    }

    pub fn with_dataset(mut self, name: impl Into<String>) -> Self {
        self.dataset = Some(name.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Normalises raw rows, keeping at most `limit`
    pub fn normalize(&self, rows: &[QueryRow]) -> Vec<Earthquake> {
        let keep = rows.len().min(self.limit);
        from_rows(&rows[..keep])
    }

    #[cfg(feature = "http")]
    pub fn url(&self) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| QuakeError::Dataset(format!("bad endpoint '{}': {}", self.endpoint, e)))?;
        if let Some(name) = &self.dataset {
            url.query_pairs_mut().append_pair("dataset", name);
        }
        Ok(url)
    }

    /// Fetches and normalises the rows.
    ///
    /// Every failure comes back as [`QuakeError::Dataset`] so the caller can
    /// show it inline.
    #[cfg(feature = "http")]
    pub async fn fetch(&self) -> Result<Vec<Earthquake>> {
        use crate::tiles::client::http::HTTP_CLIENT;

        let url = self.url()?;
        log::info!("querying dataset {:?} from {}", self.dataset, url);
        let response = HTTP_CLIENT
            .get(url)
            .send()
            .await
            .map_err(|e| QuakeError::Dataset(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(QuakeError::Dataset(format!("HTTP {}", response.status())));
        }
        let rows: Vec<QueryRow> = response
            .json()
            .await
            .map_err(|e| QuakeError::Dataset(format!("unreadable rows: {}", e)))?;
        let events = self.normalize(&rows);
        log::info!("dataset query returned {} events", events.len());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_and_limit() {
        let query = DatasetQuery::new("http://localhost/api/earthquakes");
        assert_eq!(query.limit, 2000);
        assert_eq!(query.dataset, None);

        let rows: Vec<QueryRow> = (0..5)
            .map(|i| QueryRow {
                magnitude: json!(i),
                ..Default::default()
            })
            .collect();
        let events = query.with_limit(3).normalize(&rows);
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].amplitude, 2.0);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_url_encodes_dataset() {
        let query = DatasetQuery::new("http://localhost:3000/api/earthquakes").with_dataset("taiwan 2024");
        assert_eq!(
            query.url().unwrap().as_str(),
            "http://localhost:3000/api/earthquakes?dataset=taiwan+2024"
        );
        assert!(matches!(
            DatasetQuery::new("not a url").url(),
            Err(QuakeError::Dataset(_))
        ));
    }
}
