//! Flight selection.
//!
//! The tiered policy walks campaign types in priority order (paid, affiliate,
//! community, house) and draws within the first tier that has any weighted
//! need, so a flight further behind its pace gets proportionally more
//! traffic while higher tiers always win over lower ones.

use std::sync::Arc;

use adserver_core::types::{CampaignType, Flight};
use rand::Rng;
use tracing::debug;

use crate::context::TargetingContext;
use crate::targeting::TargetingPredicate;
use crate::weighted::{choose_uniform, WeightedRanges};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPolicy {
    /// Uniform choice among flights passing targeting.
    Uniform,
    /// Campaign-type tiers, weighted by need today within a tier.
    Tiered,
}

#[derive(Clone)]
pub struct FlightSelector {
    policy: FlightPolicy,
    targeting: Arc<dyn TargetingPredicate>,
}

impl FlightSelector {
    pub fn new(policy: FlightPolicy, targeting: Arc<dyn TargetingPredicate>) -> Self {
        Self { policy, targeting }
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: Vec<Arc<Flight>>,
        ctx: &TargetingContext,
        rng: &mut R,
    ) -> Option<Arc<Flight>> {
        match self.policy {
            FlightPolicy::Uniform => self.select_uniform(candidates, ctx, rng),
            FlightPolicy::Tiered => self.select_tiered(candidates, ctx, rng),
        }
    }

    fn select_uniform<R: Rng + ?Sized>(
        &self,
        candidates: Vec<Arc<Flight>>,
        ctx: &TargetingContext,
        rng: &mut R,
    ) -> Option<Arc<Flight>> {
        let targeted: Vec<Arc<Flight>> = candidates
            .into_iter()
            .filter(|flight| self.targeting.passes(flight, ctx))
            .collect();
        choose_uniform(rng, targeted)
    }

    fn select_tiered<R: Rng + ?Sized>(
        &self,
        candidates: Vec<Arc<Flight>>,
        ctx: &TargetingContext,
        rng: &mut R,
    ) -> Option<Arc<Flight>> {
        if ctx.is_forced() {
            // Priorities and pacing do not apply to a forced ad or campaign.
            return choose_uniform(rng, candidates);
        }

        for (campaign_type, tier) in partition_tiers(candidates) {
            if tier.is_empty() {
                continue;
            }

            let mut ranges = WeightedRanges::new();
            for flight in tier {
                if !self.targeting.passes(&flight, ctx) {
                    continue;
                }
                let weight = self
                    .targeting
                    .weighted_need_today(&flight, &ctx.publisher, ctx.now);
                ranges.push(weight, flight);
            }

            let total_weight = ranges.total();
            let weighted = ranges.len();
            if let Some(flight) = ranges.into_choice(rng) {
                debug!(
                    tier = %campaign_type,
                    flight = %flight.slug,
                    weighted,
                    total_weight,
                    "Selected flight"
                );
                return Some(flight);
            }
        }

        None
    }
}

/// Split flights into campaign-type tiers, highest priority first.
pub fn partition_tiers(flights: Vec<Arc<Flight>>) -> [(CampaignType, Vec<Arc<Flight>>); 4] {
    let mut tiers = CampaignType::ALL.map(|t| (t, Vec::new()));
    for flight in flights {
        // Discriminants follow declaration order, which is `ALL` order.
        tiers[flight.campaign_type() as usize].1.push(flight);
    }
    tiers
}
