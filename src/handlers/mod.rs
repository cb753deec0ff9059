//! HTTP handlers for the stock API.

pub mod etl;
pub mod stock;

use crate::errors::ServiceError;
use serde::Deserialize;
use utoipa::IntoParams;

/// `?area=<code>` query accepted by the read endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AreaQuery {
    /// Area (postal) code, e.g. `400001`
    pub area: Option<String>,
}

impl AreaQuery {
    /// Parses a raw query string. Repeated `area` keys keep the first value;
    /// unknown keys and malformed pairs are ignored, so this never fails.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let area = raw.and_then(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == "area")
                .map(|(_, value)| value.into_owned())
        });
        Self { area }
    }

    /// The requested area, or [`ServiceError::MissingParameter`] when it is
    /// absent or empty.
    pub fn require_area(&self) -> Result<&str, ServiceError> {
        match self.area.as_deref() {
            Some(area) if !area.is_empty() => Ok(area),
            _ => Err(ServiceError::MissingParameter("area")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn first_area_wins_when_repeated() {
        let query = AreaQuery::from_raw(Some("page=2&area=400001&area=201301"));
        assert_eq!(query.require_area().unwrap(), "400001");
        assert_eq!(
            AreaQuery::from_raw(Some("area=400%20001")).area.as_deref(),
            Some("400 001")
        );
        assert_matches!(
            AreaQuery::from_raw(None).require_area(),
            Err(ServiceError::MissingParameter("area"))
        );
        assert_matches!(
            AreaQuery::from_raw(Some("%%%&=")).require_area(),
            Err(ServiceError::MissingParameter("area"))
        );
    }

    #[test]
    fn missing_or_empty_area_is_rejected() {
        assert_matches!(
            AreaQuery { area: None }.require_area(),
            Err(ServiceError::MissingParameter("area"))
        );
        assert_matches!(
            AreaQuery {
                area: Some(String::new())
            }
            .require_area(),
            Err(ServiceError::MissingParameter("area"))
        );
        assert_eq!(
            AreaQuery {
                area: Some("400001".into())
            }
            .require_area()
            .unwrap(),
            "400001"
        );
    }
}
