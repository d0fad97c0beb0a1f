use crate::enrich::error::LookupError;
use crate::enrich::lookup::Lookup;
use crate::ocean::client::OceanClient;
use crate::types::coordinate::LatLon;
use crate::types::row::Row;
use crate::types::value::Value;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

pub const LONGITUDE_FIELD: &str = "decimalLongitude";
pub const LATITUDE_FIELD: &str = "decimalLatitude";
pub const YEAR_FIELD: &str = "year";
pub const MONTH_FIELD: &str = "month";
pub const DAY_FIELD: &str = "day";

/// Fields an occurrence row must carry to be enriched.
pub const OCCURRENCE_FIELDS: [&str; 5] = [
    LONGITUDE_FIELD,
    LATITUDE_FIELD,
    YEAR_FIELD,
    MONTH_FIELD,
    DAY_FIELD,
];

/// Sea temperature, in degrees Celsius.
pub const TEMPERATURE: &str = "thetao";
/// Practical salinity.
pub const SALINITY: &str = "so";

/// Looks up one ocean variable at an occurrence's position and date.
///
/// The row must carry `decimalLongitude`, `decimalLatitude`, `year`, `month` and `day`.
#[derive(Debug, Clone)]
pub struct OceanVariableLookup {
    client: Arc<OceanClient>,
    variable: String,
}

impl OceanVariableLookup {
    pub fn new(client: Arc<OceanClient>, variable: impl Into<String>) -> Self {
        Self {
            client,
            variable: variable.into(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

#[async_trait]
impl Lookup for OceanVariableLookup {
    async fn lookup(&self, row: &Row) -> Result<Option<Value>, LookupError> {
        let (location, date) = occurrence_position(row)?;
        let value = self
            .client
            .point_value(&self.variable, location, date)
            .await?;
        Ok(value.map(Value::Float))
    }
}

/// Extracts the coordinate and observation date of an occurrence row.
pub fn occurrence_position(row: &Row) -> Result<(LatLon, NaiveDate), LookupError> {
    let lon = float_field(row, LONGITUDE_FIELD)?;
    let lat = float_field(row, LATITUDE_FIELD)?;
    let location = LatLon(lat, lon);
    if !location.is_valid() {
        return Err(LookupError::InvalidCoordinate(lat, lon));
    }

    let year = int_field(row, YEAR_FIELD)?;
    let month = int_field(row, MONTH_FIELD)?;
    let day = int_field(row, DAY_FIELD)?;
    let date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .ok_or(LookupError::InvalidDate { year, month, day })?;

    Ok((location, date))
}

fn field<'a>(row: &'a Row, name: &str) -> Result<&'a Value, LookupError> {
    match row.get(name) {
        Some(Value::Null) | None => Err(LookupError::MissingField(name.to_string())),
        Some(value) => Ok(value),
    }
}

fn float_field(row: &Row, name: &str) -> Result<f64, LookupError> {
    let value = field(row, name)?;
    value.as_f64().ok_or_else(|| LookupError::InvalidField {
        field: name.to_string(),
        value: value.to_string(),
    })
}

fn int_field(row: &Row, name: &str) -> Result<i64, LookupError> {
    let value = field(row, name)?;
    value.as_i64().ok_or_else(|| LookupError::InvalidField {
        field: name.to_string(),
        value: value.to_string(),
    })
}
