//! Point queries against a griddap-style oceanographic data service.
//!
//! A query asks for one variable on one day at one coordinate, restricted to a depth
//! band near the surface. The service answers with a JSON table whose first row holds
//! the value of the nearest grid cell (first time step, first depth level).

use crate::enrich::error::LookupError;
use crate::ocean::credentials::OceanCredentials;
use crate::ocean::error::OceanError;
use crate::types::coordinate::LatLon;
use bon::bon;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Daily global physics reanalysis at 1/12 degree.
pub const DEFAULT_DATASET: &str = "cmems_mod_glo_phy_my_0.083deg_P1D-m";
pub const DEFAULT_MIN_DEPTH: f64 = 1.0;
pub const DEFAULT_MAX_DEPTH: f64 = 2.0;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for single-point variable queries.
///
/// Holds the HTTP connection pool and the login, and is shared between all lookups of a
/// run. Every request carries the credentials as HTTP basic auth and is bounded by the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct OceanClient {
    http: Client,
    base_url: String,
    credentials: OceanCredentials,
    dataset: String,
    min_depth: f64,
    max_depth: f64,
}

#[derive(Debug, Deserialize)]
struct GriddapResponse {
    table: GriddapTable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GriddapTable {
    column_names: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[bon]
impl OceanClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`OceanError::InvalidDepthRange`] if the depth bounds are not finite or
    /// `min_depth > max_depth`, and [`OceanError::HttpClient`] if the HTTP client cannot
    /// be constructed.
    ///
    /// # Examples
    ///
    /// ```
    /// use biomarine::{OceanClient, OceanCredentials};
    /// use std::time::Duration;
    ///
    /// let client = OceanClient::builder()
    ///     .base_url("https://ocean.example.org/erddap")
    ///     .credentials(OceanCredentials::new("user", "pass"))
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(client.dataset(), "cmems_mod_glo_phy_my_0.083deg_P1D-m");
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        credentials: OceanCredentials,
        #[builder(into)] dataset: Option<String>,
        min_depth: Option<f64>,
        max_depth: Option<f64>,
        timeout: Option<Duration>,
    ) -> Result<Self, OceanError> {
        let min_depth = min_depth.unwrap_or(DEFAULT_MIN_DEPTH);
        let max_depth = max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if !min_depth.is_finite() || !max_depth.is_finite() || min_depth > max_depth {
            return Err(OceanError::InvalidDepthRange {
                min: min_depth,
                max: max_depth,
            });
        }
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(OceanError::HttpClient)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            dataset: dataset.unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            min_depth,
            max_depth,
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Fetches `variable` at `location` on `date`.
    ///
    /// Returns `Ok(None)` when the service has the grid cell but no value for it (land,
    /// ice, outside the model domain).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] when the service answers 404,
    /// [`LookupError::Timeout`] when the request exceeds the client timeout, and other
    /// [`LookupError`] variants for transport, status and decoding problems.
    pub async fn point_value(
        &self,
        variable: &str,
        location: LatLon,
        date: NaiveDate,
    ) -> Result<Option<f64>, LookupError> {
        let url = self.query_url(variable, location, date);
        debug!("Requesting {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|e| LookupError::from_request(&url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(url));
        }
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => LookupError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => LookupError::NetworkRequest(url, e),
                });
            }
        };

        let body: GriddapResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout(url.clone())
            } else {
                LookupError::Decode(url.clone(), e)
            }
        })?;
        first_value(&body.table, variable, &url)
    }

    fn query_url(&self, variable: &str, location: LatLon, date: NaiveDate) -> String {
        format!(
            "{}/griddap/{}.json?{}[({}T00:00:00Z)][({}):({})][({})][({})]",
            self.base_url,
            self.dataset,
            variable,
            date.format("%Y-%m-%d"),
            self.min_depth,
            self.max_depth,
            location.latitude(),
            location.longitude()
        )
    }
}

fn first_value(table: &GriddapTable, variable: &str, url: &str) -> Result<Option<f64>, LookupError> {
    let column = table
        .column_names
        .iter()
        .position(|name| name == variable)
        .ok_or_else(|| LookupError::UnexpectedResponse {
            url: url.to_string(),
            message: format!("no '{}' column in response", variable),
        })?;
    let Some(cell) = table.rows.first().and_then(|row| row.get(column)) else {
        return Ok(None);
    };
    match cell {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => Ok(n.as_f64().filter(|v| v.is_finite())),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("nan") => Ok(None),
        serde_json::Value::String(s) => s.parse::<f64>().map(Some).map_err(|_| {
            LookupError::UnexpectedResponse {
                url: url.to_string(),
                message: format!("non-numeric value '{}' for '{}'", s, variable),
            }
        }),
        other => Err(LookupError::UnexpectedResponse {
            url: url.to_string(),
            message: format!("unexpected value {} for '{}'", other, variable),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DATASET_PATH: &str = "/griddap/cmems_mod_glo_phy_my_0.083deg_P1D-m.json";

    fn client(server: &MockServer) -> OceanClient {
        OceanClient::builder()
            .base_url(server.uri())
            .credentials(OceanCredentials::new("user", "pass"))
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }

    fn abrolhos() -> LatLon {
        LatLon(-17.96, -38.7)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, 14).unwrap()
    }

    fn body(value: serde_json::Value) -> serde_json::Value {
        json!({
            "table": {
                "columnNames": ["time", "depth", "latitude", "longitude", "thetao"],
                "columnTypes": ["String", "float", "float", "float", "float"],
                "rows": [
                    ["2019-03-14T00:00:00Z", 1.54, -17.9583, -38.6667, value],
                    ["2019-03-14T00:00:00Z", 1.54, -17.9583, -38.75, 99.0]
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_reads_first_row_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(json!(26.3))))
            .expect(1)
            .mount(&server)
            .await;

        let value = client(&server)
            .point_value("thetao", abrolhos(), day())
            .await
            .unwrap();
        assert_eq!(value, Some(26.3));
    }

    #[tokio::test]
    async fn test_null_cell_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(json!(null))))
            .mount(&server)
            .await;

        let value = client(&server)
            .point_value("thetao", abrolhos(), day())
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server)
            .point_value("thetao", abrolhos(), day())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server)
            .point_value("so", abrolhos(), day())
            .await
            .unwrap_err();
        match err {
            LookupError::HttpStatus { status, .. } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body(json!(26.3)))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .point_value("thetao", abrolhos(), day())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_variable_column() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(json!(26.3))))
            .mount(&server)
            .await;

        let err = client(&server)
            .point_value("so", abrolhos(), day())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::UnexpectedResponse { .. }));
    }

    #[test]
    fn test_query_url_layout() {
        let client = OceanClient::builder()
            .base_url("https://ocean.example.org/erddap/")
            .credentials(OceanCredentials::new("user", "pass"))
            .build()
            .unwrap();
        assert_eq!(
            client.query_url("so", abrolhos(), day()),
            "https://ocean.example.org/erddap/griddap/cmems_mod_glo_phy_my_0.083deg_P1D-m.json\
             ?so[(2019-03-14T00:00:00Z)][(1):(2)][(-17.96)][(-38.7)]"
        );
    }

    #[test]
    fn test_inverted_depth_range_rejected() {
        let result = OceanClient::builder()
            .base_url("https://ocean.example.org/erddap")
            .credentials(OceanCredentials::new("user", "pass"))
            .min_depth(5.0)
            .max_depth(2.0)
            .build();
        assert!(matches!(result, Err(OceanError::InvalidDepthRange { .. })));
    }
}
