//! Client for the GBIF occurrence search API.

use crate::occurrences::error::OccurrenceError;
use crate::occurrences::projection::project_records;
use crate::occurrences::query::{BoundingBox, EventDateRange};
use crate::types::row::Table;
use bon::bon;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.gbif.org/v1";
pub const BASE_URL_VAR: &str = "GBIF_API_URL";
/// Largest page the search endpoint serves.
pub const MAX_PAGE_SIZE: usize = 300;
pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OccurrencePage {
    #[serde(default)]
    end_of_records: bool,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    results: Vec<Map<String, JsonValue>>,
}

/// Searches georeferenced species occurrences.
///
/// # Examples
///
/// ```no_run
/// use biomarine::{BoundingBox, EventDateRange, OccurrenceClient};
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OccurrenceClient::builder().build()?;
/// let table = client
///     .search()
///     .scientific_name("Megaptera novaeangliae")
///     .bounding_box(BoundingBox::new(-10.0, -30.0, -30.0, -50.0)?)
///     .event_dates(EventDateRange::new(
///         NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
///     )?)
///     .limit(50)
///     .call()
///     .await?;
/// println!("{} occurrences", table.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OccurrenceClient {
    http: Client,
    base_url: String,
    page_size: usize,
}

#[bon]
impl OccurrenceClient {
    /// Creates a client. `base_url` defaults to the public GBIF API and `page_size` to
    /// [`MAX_PAGE_SIZE`]; larger page sizes are capped.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: Option<String>,
        page_size: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<Self, OccurrenceError> {
        let mut http = Client::builder();
        if let Some(timeout) = timeout {
            http = http.timeout(timeout);
        }
        Ok(Self {
            http: http.build().map_err(OccurrenceError::HttpClient)?,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            page_size: page_size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        })
    }

    /// Fetches up to `limit` occurrences of `scientific_name` inside `bounding_box`
    /// observed within `event_dates`, keeping only records with coordinates.
    ///
    /// Pages are requested until `limit` records are collected or the service reports
    /// the end of the result set. The records are projected onto
    /// [`crate::OCCURRENCE_COLUMNS`].
    #[builder]
    pub async fn search(
        &self,
        scientific_name: &str,
        bounding_box: BoundingBox,
        event_dates: EventDateRange,
        limit: Option<usize>,
    ) -> Result<Table, OccurrenceError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let mut records: Vec<Map<String, JsonValue>> = Vec::new();

        while records.len() < limit {
            let offset = records.len();
            let page_size = (limit - offset).min(self.page_size);
            let page = self
                .fetch_page(scientific_name, &bounding_box, &event_dates, offset, page_size)
                .await?;
            let received = page.results.len();
            debug!(
                "Page at offset {} returned {} records (total {:?})",
                offset, received, page.count
            );
            records.extend(page.results);
            if page.end_of_records || received == 0 {
                break;
            }
        }
        records.truncate(limit);

        info!(
            "Found {} occurrences of '{}' between {} and {}",
            records.len(),
            scientific_name,
            event_dates.begin,
            event_dates.end
        );
        Ok(project_records(&records))
    }

    async fn fetch_page(
        &self,
        scientific_name: &str,
        bounding_box: &BoundingBox,
        event_dates: &EventDateRange,
        offset: usize,
        page_size: usize,
    ) -> Result<OccurrencePage, OccurrenceError> {
        let url = format!("{}/occurrence/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("scientificName", scientific_name.to_string()),
                ("decimalLatitude", bounding_box.latitude_param()),
                ("decimalLongitude", bounding_box.longitude_param()),
                ("eventDate", event_dates.param()),
                ("hasCoordinate", "true".to_string()),
                ("offset", offset.to_string()),
                ("limit", page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| OccurrenceError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => OccurrenceError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => OccurrenceError::NetworkRequest(url, e),
                });
            }
        };

        response
            .json::<OccurrencePage>()
            .await
            .map_err(|e| OccurrenceError::Decode(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Value;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bbox() -> BoundingBox {
        BoundingBox::new(-10.0, -30.0, -30.0, -50.0).unwrap()
    }

    fn dates() -> EventDateRange {
        EventDateRange::new(
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
        .unwrap()
    }

    fn records(first_year: i64, n: usize) -> Vec<JsonValue> {
        (0..n)
            .map(|i| {
                json!({
                    "decimalLongitude": -40.0 - i as f64,
                    "decimalLatitude": -20.0,
                    "year": first_year + i as i64,
                    "month": 6,
                    "day": 1,
                    "country": "Brazil"
                })
            })
            .collect()
    }

    async fn mount_page(server: &MockServer, offset: &str, limit: &str, body: JsonValue) {
        Mock::given(method("GET"))
            .and(path("/occurrence/search"))
            .and(query_param("offset", offset))
            .and(query_param("limit", limit))
            .and(query_param("scientificName", "Chelonia mydas"))
            .and(query_param("decimalLatitude", "-30,-10"))
            .and(query_param("decimalLongitude", "-50,-30"))
            .and(query_param("eventDate", "2015-01-01,2020-12-31"))
            .and(query_param("hasCoordinate", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn client(server: &MockServer, page_size: usize) -> OccurrenceClient {
        OccurrenceClient::builder()
            .base_url(server.uri())
            .page_size(page_size)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_pages_until_limit() -> Result<(), OccurrenceError> {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "0",
            "2",
            json!({"offset": 0, "limit": 2, "endOfRecords": false, "count": 10, "results": records(2010, 2)}),
        )
        .await;
        mount_page(
            &server,
            "2",
            "2",
            json!({"offset": 2, "limit": 2, "endOfRecords": false, "count": 10, "results": records(2012, 2)}),
        )
        .await;
        mount_page(
            &server,
            "4",
            "1",
            json!({"offset": 4, "limit": 1, "endOfRecords": false, "count": 10, "results": records(2014, 1)}),
        )
        .await;

        let table = client(&server, 2)
            .search()
            .scientific_name("Chelonia mydas")
            .bounding_box(bbox())
            .event_dates(dates())
            .limit(5)
            .call()
            .await?;

        assert_eq!(table.len(), 5);
        assert_eq!(
            table.columns(),
            &["decimalLongitude", "decimalLatitude", "year", "day", "month"]
        );
        let years: Vec<Option<i64>> = table
            .rows()
            .iter()
            .map(|row| row.get("year").and_then(Value::as_i64))
            .collect();
        assert_eq!(
            years,
            vec![Some(2010), Some(2011), Some(2012), Some(2013), Some(2014)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_stops_at_end_of_records() -> Result<(), OccurrenceError> {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "0",
            "100",
            json!({"offset": 0, "limit": 100, "endOfRecords": true, "count": 3, "results": records(2016, 3)}),
        )
        .await;

        let table = client(&server, MAX_PAGE_SIZE)
            .search()
            .scientific_name("Chelonia mydas")
            .bounding_box(bbox())
            .event_dates(dates())
            .call()
            .await?;
        assert_eq!(table.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_request_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid eventDate"))
            .mount(&server)
            .await;

        let result = client(&server, 10)
            .search()
            .scientific_name("Chelonia mydas")
            .bounding_box(bbox())
            .event_dates(dates())
            .call()
            .await;
        match result {
            Err(OccurrenceError::HttpStatus { status, .. }) => assert_eq!(status.as_u16(), 400),
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_limit_makes_no_request() -> Result<(), OccurrenceError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let table = client(&server, 10)
            .search()
            .scientific_name("Chelonia mydas")
            .bounding_box(bbox())
            .event_dates(dates())
            .limit(0)
            .call()
            .await?;
        assert!(table.is_empty());
        Ok(())
    }
}
