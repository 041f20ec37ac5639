//! Fixtures shared by the unit tests.

use adserver_core::pacing::PacingCounters;
use adserver_core::targeting::TargetingParameters;
use adserver_core::types::{
    Advertisement, Campaign, CampaignType, Flight, Geolocation, Placement, Publisher,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::context::{DecisionRequest, TargetingContext};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 22, 12, 0, 0).unwrap()
}

pub fn publisher() -> Publisher {
    Publisher {
        slug: "test-publisher".to_string(),
        keywords: vec![],
        publisher_groups: vec!["docs".to_string()],
        allow_paid_campaigns: true,
        allow_affiliate_campaigns: true,
        allow_community_campaigns: true,
        allow_house_campaigns: true,
    }
}

/// One placement per ad type, all at priority 1.
pub fn context(ad_types: &[&str]) -> TargetingContext {
    context_for(publisher(), ad_types)
}

pub fn context_for(publisher: Publisher, ad_types: &[&str]) -> TargetingContext {
    let request = DecisionRequest {
        placements: ad_types.iter().map(|t| Placement::new(*t, 1)).collect(),
        publisher: publisher.slug.clone(),
        geolocation: Geolocation {
            country_code: Some("US".to_string()),
            region_code: Some("CA".to_string()),
            metro_code: Some(807),
        },
        user_agent_is_mobile: false,
        keywords: None,
        campaign_types: None,
        url: None,
        ad_slug: None,
        campaign_slug: None,
    };
    TargetingContext::new(request, publisher, now())
}

pub fn ad(slug: &str, ad_types: &[&str]) -> Advertisement {
    Advertisement {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: slug.to_string(),
        live: true,
        ad_types: ad_types.iter().map(|t| t.to_string()).collect(),
        flight_slug: String::new(),
        campaign_slug: String::new(),
    }
}

/// A live flight running on the test publisher with plenty of clicks left.
pub fn flight(slug: &str, campaign_type: CampaignType, ads: Vec<Advertisement>) -> Flight {
    let mut flight = Flight {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: slug.to_string(),
        campaign: Campaign {
            id: Uuid::new_v4(),
            slug: format!("campaign-{slug}"),
            name: slug.to_string(),
            campaign_type,
            publishers: vec!["test-publisher".to_string()],
            publisher_groups: vec![],
            exclude_publishers: vec![],
        },
        live: true,
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        targeting: TargetingParameters::default(),
        pacing: PacingCounters {
            sold_clicks: 10_000,
            ..Default::default()
        },
        advertisements: ads,
    };
    flight.link_advertisements();
    flight
}
