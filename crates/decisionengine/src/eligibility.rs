//! Candidate flights for a request: live, in date, allowed on the publisher,
//! and carrying an ad that fits one of the requested placements.

use std::sync::Arc;

use adserver_core::types::{CampaignType, Flight, Publisher};
use adserver_core::AdServerResult;
use chrono::NaiveDate;
use tracing::debug;

use crate::context::{ForcedSlug, TargetingContext};
use crate::store::FlightStore;

/// Eligibility requirements handed to a [`FlightStore`].
#[derive(Debug, Clone, Copy)]
pub struct FlightQuery<'a> {
    pub ad_types: &'a [String],
    pub campaign_types: &'a [CampaignType],
    pub publisher: &'a Publisher,
    /// When set, live and date checks are skipped for the matching flight.
    pub forced: Option<ForcedSlug<'a>>,
    pub today: NaiveDate,
}

impl<'a> FlightQuery<'a> {
    pub fn for_context(ctx: &'a TargetingContext) -> Self {
        Self {
            ad_types: &ctx.ad_types,
            campaign_types: &ctx.campaign_types,
            publisher: &ctx.publisher,
            forced: ctx.forced(),
            today: ctx.today(),
        }
    }

    pub fn matches(&self, flight: &Flight) -> bool {
        if !self.campaign_types.contains(&flight.campaign_type()) {
            return false;
        }

        if !flight.campaign.runs_on(self.publisher) {
            return false;
        }

        if !flight
            .advertisements
            .iter()
            .any(|ad| ad.matches_any_ad_type(self.ad_types))
        {
            return false;
        }

        match self.forced {
            Some(ForcedSlug::Ad(slug)) => flight.ads_with_slug(slug).next().is_some(),
            Some(ForcedSlug::Campaign(slug)) => flight.campaign.slug == slug,
            None => {
                flight.is_running(self.today)
                    && flight.live_ads_matching(self.ad_types).next().is_some()
            }
        }
    }
}

/// Narrows the store's flights to the candidates for one request.
#[derive(Clone)]
pub struct EligibilityFilter {
    store: Arc<dyn FlightStore>,
}

impl EligibilityFilter {
    pub fn new(store: Arc<dyn FlightStore>) -> Self {
        Self { store }
    }

    /// Unordered candidate set. Reads only; safe to call repeatedly.
    pub fn candidates(&self, ctx: &TargetingContext) -> AdServerResult<Vec<Arc<Flight>>> {
        if ctx.ad_types.is_empty() || ctx.campaign_types.is_empty() {
            debug!(
                publisher = %ctx.publisher.slug,
                ad_types = ?ctx.ad_types,
                campaign_types = ?ctx.campaign_types,
                "Nothing can be requested"
            );
            return Ok(Vec::new());
        }

        if !ctx.allows_all_campaign_types() {
            debug!(
                campaign_types = ?ctx.campaign_types,
                "Ads restricted to the following campaign types"
            );
        }

        match ctx.forced() {
            Some(ForcedSlug::Ad(slug)) => debug!(ad_slug = slug, "Restricting ad decision"),
            Some(ForcedSlug::Campaign(slug)) => {
                debug!(campaign = slug, "Restricting ad decision")
            }
            None => {}
        }

        self.store.query_flights(&FlightQuery::for_context(ctx))
    }
}
