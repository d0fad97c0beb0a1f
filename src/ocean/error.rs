use thiserror::Error;

#[derive(Debug, Error)]
pub enum OceanError {
    #[error("Environment variable {0} is not set; ocean data credentials are required")]
    MissingCredential(&'static str),

    #[error("No ocean data service URL configured; set {0} or pass --service-url")]
    MissingServiceUrl(&'static str),

    #[error("Invalid depth range {min}..{max}")]
    InvalidDepthRange { min: f64, max: f64 },

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}
