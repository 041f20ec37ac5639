//! Per-flight targeting and pacing checks.

use adserver_core::config::PacingConfig;
use adserver_core::types::{Flight, Publisher};
use chrono::{DateTime, Utc};
use tracing::trace;

use crate::context::TargetingContext;

/// Decides whether a candidate flight may serve this request and how much it
/// still needs to deliver today.
pub trait TargetingPredicate: Send + Sync {
    /// Whether `flight` may serve the request in `ctx`.
    fn passes(&self, flight: &Flight, ctx: &TargetingContext) -> bool;

    /// Selection weight. Zero means no delivery is needed today.
    fn weighted_need_today(&self, flight: &Flight, publisher: &Publisher, now: DateTime<Utc>)
        -> u64;
}

/// Geo, keyword and mobile rules from the flight's targeting parameters,
/// plus interval pacing.
#[derive(Debug, Clone)]
pub struct RuleTargeting {
    pacing_interval_secs: u32,
}

impl RuleTargeting {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            pacing_interval_secs: config.interval_secs,
        }
    }
}

impl Default for RuleTargeting {
    fn default() -> Self {
        Self::new(&PacingConfig::default())
    }
}

impl TargetingPredicate for RuleTargeting {
    fn passes(&self, flight: &Flight, ctx: &TargetingContext) -> bool {
        // The override already restricted candidates to one ad or campaign.
        if ctx.is_forced() {
            return true;
        }

        if !flight.targeting.show_to_geo(&ctx.geolocation) {
            trace!(flight = %flight.slug, geo = ?ctx.geolocation, "Geo targeting excluded flight");
            return false;
        }

        if !flight.targeting.show_to_keywords(&ctx.keywords) {
            trace!(flight = %flight.slug, "Keyword targeting excluded flight");
            return false;
        }

        if !flight.targeting.show_to_mobile(ctx.is_mobile) {
            trace!(flight = %flight.slug, mobile = ctx.is_mobile, "Mobile targeting excluded flight");
            return false;
        }

        if self.weighted_need_today(flight, &ctx.publisher, ctx.now) == 0 {
            trace!(flight = %flight.slug, "Flight is on pace for today");
            return false;
        }

        true
    }

    fn weighted_need_today(
        &self,
        flight: &Flight,
        publisher: &Publisher,
        now: DateTime<Utc>,
    ) -> u64 {
        flight.weighted_need_today(publisher, now, self.pacing_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ad, context, flight};
    use adserver_core::targeting::MobileTraffic;
    use adserver_core::types::CampaignType;

    #[test]
    fn test_passes_with_open_targeting_and_need() {
        let ctx = context(&["text"]);
        let f = flight("f1", CampaignType::Paid, vec![ad("a1", &["text"])]);
        assert!(RuleTargeting::default().passes(&f, &ctx));
    }

    #[test]
    fn test_each_rule_can_exclude() {
        let targeting = RuleTargeting::default();
        let mut ctx = context(&["text"]);
        ctx.geolocation.country_code = Some("DE".to_string());
        ctx.keywords = vec!["php".to_string()];
        ctx.is_mobile = true;

        let mut geo = flight("geo", CampaignType::Paid, vec![ad("a1", &["text"])]);
        geo.targeting.exclude_countries = vec!["DE".to_string()];
        assert!(!targeting.passes(&geo, &ctx));

        let mut keywords = flight("kw", CampaignType::Paid, vec![ad("a2", &["text"])]);
        keywords.targeting.exclude_keywords = vec!["php".to_string()];
        assert!(!targeting.passes(&keywords, &ctx));

        let mut mobile = flight("mobile", CampaignType::Paid, vec![ad("a3", &["text"])]);
        mobile.targeting.mobile_traffic = Some(MobileTraffic::Exclude);
        assert!(!targeting.passes(&mobile, &ctx));

        let mut paced = flight("paced", CampaignType::Paid, vec![ad("a4", &["text"])]);
        paced.pacing.total_clicks = paced.pacing.sold_clicks;
        assert!(!targeting.passes(&paced, &ctx));
    }

    #[test]
    fn test_forced_slug_skips_checks() {
        let mut ctx = context(&["text"]);
        ctx.campaign_slug = Some("campaign-f1".to_string());

        let mut f = flight("f1", CampaignType::Paid, vec![ad("a1", &["text"])]);
        f.targeting.include_countries = vec!["JP".to_string()];
        f.pacing.sold_clicks = 0;
        assert!(RuleTargeting::default().passes(&f, &ctx));
    }

    #[test]
    fn test_weighted_need_uses_configured_interval() {
        let ctx = context(&["text"]);
        let f = flight("f1", CampaignType::Paid, vec![ad("a1", &["text"])]);

        let hourly = RuleTargeting::default();
        let daily = RuleTargeting::new(&PacingConfig {
            interval_secs: 86_400,
        });
        assert!(
            daily.weighted_need_today(&f, &ctx.publisher, ctx.now)
                >= hourly.weighted_need_today(&f, &ctx.publisher, ctx.now)
        );
        assert!(hourly.weighted_need_today(&f, &ctx.publisher, ctx.now) > 0);
    }
}
