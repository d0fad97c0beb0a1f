//! Search filters for occurrence queries.

use crate::occurrences::error::OccurrenceError;
use chrono::NaiveDate;

/// A latitude/longitude rectangle, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Creates a box from its edges, given in the order the command line takes them.
    ///
    /// # Errors
    ///
    /// Returns [`OccurrenceError::InvalidBoundingBox`] if an edge is not finite, lies
    /// outside the valid latitude/longitude range, or a minimum exceeds its maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use biomarine::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(-10.0, -30.0, -30.0, -50.0).unwrap();
    /// assert_eq!(bbox.latitude_param(), "-30,-10");
    /// assert_eq!(bbox.longitude_param(), "-50,-30");
    /// assert!(BoundingBox::new(-30.0, -10.0, -30.0, -50.0).is_err());
    /// ```
    pub fn new(
        lat_max: f64,
        lat_min: f64,
        lon_max: f64,
        lon_min: f64,
    ) -> Result<Self, OccurrenceError> {
        let edges = [lat_max, lat_min, lon_max, lon_min];
        if edges.iter().any(|edge| !edge.is_finite()) {
            return Err(OccurrenceError::InvalidBoundingBox(format!(
                "edges must be finite numbers, got {:?}",
                edges
            )));
        }
        for lat in [lat_min, lat_max] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(OccurrenceError::InvalidBoundingBox(format!(
                    "latitude {} outside -90..90",
                    lat
                )));
            }
        }
        for lon in [lon_min, lon_max] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(OccurrenceError::InvalidBoundingBox(format!(
                    "longitude {} outside -180..180",
                    lon
                )));
            }
        }
        if lat_min > lat_max {
            return Err(OccurrenceError::InvalidBoundingBox(format!(
                "minimum latitude {} is above maximum {}",
                lat_min, lat_max
            )));
        }
        if lon_min > lon_max {
            return Err(OccurrenceError::InvalidBoundingBox(format!(
                "minimum longitude {} is above maximum {}",
                lon_min, lon_max
            )));
        }
        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    /// `min,max` range for the `decimalLatitude` filter.
    pub fn latitude_param(&self) -> String {
        format!("{},{}", self.lat_min, self.lat_max)
    }

    /// `min,max` range for the `decimalLongitude` filter.
    pub fn longitude_param(&self) -> String {
        format!("{},{}", self.lon_min, self.lon_max)
    }
}

/// Inclusive range of event dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDateRange {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl EventDateRange {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Result<Self, OccurrenceError> {
        if begin > end {
            return Err(OccurrenceError::InvalidDateRange { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// `YYYY-MM-DD,YYYY-MM-DD` range for the `eventDate` filter.
    pub fn param(&self) -> String {
        format!(
            "{},{}",
            self.begin.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
