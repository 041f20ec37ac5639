//! Flight storage seen from the decision engine.
//!
//! [`FlightStore`] is the query interface the engine consumes. The in-memory
//! store keeps flights in a `DashMap` so concurrent decisions read without
//! contending on a single lock.

use std::path::Path;
use std::sync::Arc;

use adserver_core::targeting::validate_targeting;
use adserver_core::types::{Flight, Publisher};
use adserver_core::{AdServerError, AdServerResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::eligibility::FlightQuery;

/// Read access to campaign inventory.
pub trait FlightStore: Send + Sync {
    /// Flights satisfying `query`, in no particular order.
    fn query_flights(&self, query: &FlightQuery<'_>) -> AdServerResult<Vec<Arc<Flight>>>;
}

/// Lock-free in-process flight store keyed by flight slug.
#[derive(Default)]
pub struct InMemoryFlightStore {
    flights: DashMap<String, Arc<Flight>>,
}

impl InMemoryFlightStore {
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
        }
    }

    pub fn from_flights(flights: impl IntoIterator<Item = Flight>) -> Self {
        let store = Self::new();
        for flight in flights {
            store.upsert(flight);
        }
        store
    }

    /// Insert or replace a flight. Readers holding the previous version keep
    /// it until they drop their `Arc`.
    pub fn upsert(&self, mut flight: Flight) -> Option<Arc<Flight>> {
        flight.link_advertisements();
        self.flights.insert(flight.slug.clone(), Arc::new(flight))
    }

    pub fn remove(&self, slug: &str) -> Option<Arc<Flight>> {
        self.flights.remove(slug).map(|(_, flight)| flight)
    }

    pub fn get(&self, slug: &str) -> Option<Arc<Flight>> {
        self.flights.get(slug).map(|f| Arc::clone(f.value()))
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

impl FlightStore for InMemoryFlightStore {
    fn query_flights(&self, query: &FlightQuery<'_>) -> AdServerResult<Vec<Arc<Flight>>> {
        Ok(self
            .flights
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect())
    }
}

/// A serialized copy of publishers and flights, as exported by campaign
/// management.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub flights: Vec<Flight>,
}

impl InventorySnapshot {
    /// Parse a snapshot. Every flight's targeting is validated before it is
    /// accepted.
    pub fn from_json(json: &str) -> AdServerResult<Self> {
        let raw: Value = serde_json::from_str(json)?;

        if let Some(flights) = raw.get("flights").and_then(Value::as_array) {
            for flight in flights {
                if let Some(targeting) = flight.get("targeting") {
                    validate_targeting(targeting).map_err(|source| AdServerError::Validation {
                        flight: flight
                            .get("slug")
                            .and_then(Value::as_str)
                            .unwrap_or("?")
                            .to_string(),
                        source,
                    })?;
                }
            }
        }

        Ok(serde_json::from_value(raw)?)
    }

    pub fn load(path: &Path) -> AdServerResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn publisher(&self, slug: &str) -> AdServerResult<&Publisher> {
        self.publishers
            .iter()
            .find(|p| p.slug == slug)
            .ok_or_else(|| AdServerError::UnknownPublisher(slug.to_string()))
    }

    pub fn to_store(&self) -> InMemoryFlightStore {
        InMemoryFlightStore::from_flights(self.flights.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ad, flight};
    use adserver_core::types::CampaignType;

    const SNAPSHOT: &str = r#"{
        "publishers": [{"slug": "docs-site", "allow_paid_campaigns": true}],
        "flights": [{
            "id": "4f1c2a7e-9a55-4c3b-8f7e-0d8a8b0b8d11",
            "slug": "spring-flight",
            "campaign": {
                "id": "0b3a9a3e-2f7e-4a44-9a8d-7a0f9f1f5c22",
                "slug": "spring",
                "name": "Spring",
                "campaign_type": "paid",
                "publishers": ["docs-site"]
            },
            "live": true,
            "start_date": "2024-03-01",
            "end_date": "2024-03-31",
            "targeting": {"include_countries": ["US"], "mobile_traffic": "exclude"},
            "pacing": {"sold_clicks": 1000},
            "advertisements": [{
                "id": "8c7d6e5f-1a2b-4c3d-9e8f-7a6b5c4d3e21",
                "slug": "spring-text",
                "live": true,
                "ad_types": ["text"]
            }]
        }]
    }"#;

    #[test]
    fn test_upsert_links_advertisements() {
        let store = InMemoryFlightStore::new();
        store.upsert(flight("f1", CampaignType::Paid, vec![ad("a1", &["text"])]));

        let stored = store.get("f1").unwrap();
        assert_eq!(stored.advertisements[0].flight_slug, "f1");
        assert_eq!(stored.advertisements[0].campaign_slug, "campaign-f1");
        assert_eq!(store.len(), 1);

        assert!(store.remove("f1").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip_into_store() {
        let snapshot = InventorySnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.publisher("docs-site").unwrap().slug, "docs-site");
        assert!(matches!(
            snapshot.publisher("nope"),
            Err(AdServerError::UnknownPublisher(_))
        ));

        let store = snapshot.to_store();
        let flight = store.get("spring-flight").unwrap();
        assert_eq!(flight.targeting.include_countries, vec!["US".to_string()]);
        assert_eq!(flight.pacing.priority_multiplier, 1);
        assert_eq!(flight.advertisements[0].campaign_slug, "spring");
    }

    #[test]
    fn test_snapshot_rejects_invalid_targeting() {
        let bad = SNAPSHOT.replace(r#""include_countries": ["US"]"#, r#""include_planets": ["mars"]"#);
        let err = InventorySnapshot::from_json(&bad).unwrap_err();
        assert!(matches!(err, AdServerError::Validation { ref flight, .. } if flight == "spring-flight"));
    }
}
