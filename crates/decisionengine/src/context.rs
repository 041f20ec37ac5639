//! Request normalization: turns an inbound ad request into the immutable
//! [`TargetingContext`] every later stage reads from.

use std::collections::BTreeSet;

use adserver_core::types::{CampaignType, Geolocation, Placement, Publisher};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An ad request as received from the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Possible slots for the ad, in the caller's order of preference.
    pub placements: Vec<Placement>,
    /// Publisher slug.
    pub publisher: String,
    #[serde(default)]
    pub geolocation: Geolocation,
    #[serde(default)]
    pub user_agent_is_mobile: bool,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub campaign_types: Option<Vec<CampaignType>>,
    #[serde(default)]
    pub url: Option<String>,
    /// Only consider this advertisement.
    #[serde(default)]
    pub ad_slug: Option<String>,
    /// Only consider flights of this campaign.
    #[serde(default)]
    pub campaign_slug: Option<String>,
}

/// A request restricted to one advertisement or one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedSlug<'a> {
    Ad(&'a str),
    Campaign(&'a str),
}

/// Everything a decision needs to know about one request.
#[derive(Debug, Clone)]
pub struct TargetingContext {
    pub publisher: Publisher,
    pub placements: Vec<Placement>,
    /// Ad types of the placements, deduplicated, in placement order.
    pub ad_types: Vec<String>,
    pub geolocation: Geolocation,
    pub is_mobile: bool,
    /// Request keywords merged with the publisher's defaults.
    pub keywords: Vec<String>,
    /// Campaign types both requested and allowed by the publisher, in
    /// priority order.
    pub campaign_types: Vec<CampaignType>,
    pub url: Option<String>,
    pub ad_slug: Option<String>,
    pub campaign_slug: Option<String>,
    /// Decision instant. Fixes "today" and the pacing interval.
    pub now: DateTime<Utc>,
}

impl TargetingContext {
    pub fn new(request: DecisionRequest, publisher: Publisher, now: DateTime<Utc>) -> Self {
        let placements: Vec<Placement> = request.placements.iter().map(Placement::clamped).collect();

        let mut ad_types: Vec<String> = Vec::with_capacity(placements.len());
        for placement in &placements {
            if !ad_types.contains(&placement.ad_type) {
                ad_types.push(placement.ad_type.clone());
            }
        }

        let mut keywords = request.keywords.unwrap_or_default();
        if !publisher.keywords.is_empty() {
            debug!(
                publisher = %publisher.slug,
                keywords = ?publisher.keywords,
                "Adding default keywords"
            );
            let merged: BTreeSet<String> = keywords
                .into_iter()
                .chain(publisher.keywords.iter().cloned())
                .collect();
            keywords = merged.into_iter().collect();
        }

        let requested = request
            .campaign_types
            .filter(|types| !types.is_empty())
            .unwrap_or_else(|| CampaignType::ALL.to_vec());
        let campaign_types = CampaignType::ALL
            .into_iter()
            .filter(|t| requested.contains(t) && publisher.allows(*t))
            .collect();

        Self {
            publisher,
            placements,
            ad_types,
            geolocation: request.geolocation,
            is_mobile: request.user_agent_is_mobile,
            keywords,
            campaign_types,
            url: request.url.filter(|u| !u.is_empty()),
            ad_slug: request.ad_slug.filter(|s| !s.is_empty()),
            campaign_slug: request.campaign_slug.filter(|s| !s.is_empty()),
            now,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// The active override. An ad slug wins over a campaign slug.
    pub fn forced(&self) -> Option<ForcedSlug<'_>> {
        self.ad_slug
            .as_deref()
            .map(ForcedSlug::Ad)
            .or_else(|| self.campaign_slug.as_deref().map(ForcedSlug::Campaign))
    }

    pub fn is_forced(&self) -> bool {
        self.ad_slug.is_some() || self.campaign_slug.is_some()
    }

    /// Whether every campaign type is allowed for this request.
    pub fn allows_all_campaign_types(&self) -> bool {
        self.campaign_types.len() == CampaignType::ALL.len()
    }
}
