//! Home domain model

use super::common::StringUuid;
use super::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A client's home, the unit appointments are booked against
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Home {
    pub id: StringUuid,
    pub owner_id: StringUuid,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub beds: i32,
    pub baths: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// The cleaner this home books with by default; set when an invitation
    /// is accepted normally, left empty for cancelled-invite signups
    pub preferred_cleaner_id: Option<StringUuid>,
    /// False until the client finishes onboarding
    pub is_setup_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Home {
    /// Known coordinates, when geocoded
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

impl Default for Home {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            owner_id: StringUuid::new_v4(),
            address_line1: String::new(),
            address_line2: None,
            city: None,
            state: None,
            postal_code: None,
            beds: 1,
            baths: 1,
            latitude: None,
            longitude: None,
            preferred_cleaner_id: None,
            is_setup_complete: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a home row
#[derive(Debug, Clone)]
pub struct CreateHomeInput {
    pub owner_id: StringUuid,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub beds: i32,
    pub baths: i32,
    pub is_setup_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut home = Home::default();
        assert!(home.location().is_none());

        home.latitude = Some(40.7128);
        assert!(home.location().is_none());

        home.longitude = Some(-74.0060);
        let point = home.location().unwrap();
        assert_eq!(point.latitude, 40.7128);
    }

    #[test]
    fn test_default_is_not_setup_complete() {
        assert!(!Home::default().is_setup_complete);
    }
}
