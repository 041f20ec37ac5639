//! Advertisement selection within a chosen flight.

use adserver_core::types::{Advertisement, Flight};
use rand::Rng;
use tracing::warn;

use crate::context::TargetingContext;
use crate::placement::resolve_placement;
use crate::weighted::{choose_uniform, WeightedRanges};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdPolicy {
    /// Any matching ad, uniformly.
    Uniform,
    /// Weighted by the priority of the placement each ad would fill.
    Weighted,
}

#[derive(Debug, Clone)]
pub struct AdSelector {
    policy: AdPolicy,
}

impl AdSelector {
    pub fn new(policy: AdPolicy) -> Self {
        Self { policy }
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        flight: &Flight,
        ctx: &TargetingContext,
        rng: &mut R,
    ) -> Option<Advertisement> {
        let candidates = candidate_ads(flight, ctx);
        match self.policy {
            AdPolicy::Uniform => choose_uniform(rng, candidates).cloned(),
            AdPolicy::Weighted => select_weighted(flight, candidates, ctx, rng),
        }
    }
}

/// A forced ad slug bypasses the live and ad type checks.
fn candidate_ads<'a>(flight: &'a Flight, ctx: &'a TargetingContext) -> Vec<&'a Advertisement> {
    match ctx.ad_slug.as_deref() {
        Some(slug) => flight.ads_with_slug(slug).collect(),
        None => flight.live_ads_matching(&ctx.ad_types).collect(),
    }
}

fn select_weighted<R: Rng + ?Sized>(
    flight: &Flight,
    candidates: Vec<&Advertisement>,
    ctx: &TargetingContext,
    rng: &mut R,
) -> Option<Advertisement> {
    let mut ranges = WeightedRanges::new();

    for ad in candidates {
        match resolve_placement(Some(ad), ctx) {
            Some(placement) => {
                ranges.push(placement.weight(), ad);
            }
            None => {
                warn!(
                    ad = %ad.slug,
                    placements = ?ctx.placements,
                    "Couldn't find a matching ad placement"
                );
                metrics::counter!("adserver.placement.unresolved").increment(1);
            }
        }
    }

    let chosen = ranges.into_choice(rng).cloned();
    if chosen.is_none() {
        warn!(
            flight = %flight.slug,
            ad_types = ?ctx.ad_types,
            "Chosen flight has no matching live ads"
        );
    }
    chosen
}
