//! Decision backends: the single entry point of the engine.

use std::sync::Arc;

use adserver_core::config::{AppConfig, BackendKind};
use adserver_core::types::{Advertisement, Placement};
use adserver_core::AdServerResult;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ad::{AdPolicy, AdSelector};
use crate::context::TargetingContext;
use crate::eligibility::EligibilityFilter;
use crate::flight::{FlightPolicy, FlightSelector};
use crate::placement::resolve_placement;
use crate::store::FlightStore;
use crate::targeting::{RuleTargeting, TargetingPredicate};

/// Outcome of one ad decision. No ad is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: Uuid,
    pub advertisement: Option<Advertisement>,
    pub placement: Option<Placement>,
    pub flight_slug: Option<String>,
}

impl Decision {
    pub fn unfilled(decision_id: Uuid) -> Self {
        Self {
            decision_id,
            advertisement: None,
            placement: None,
            flight_slug: None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.advertisement.is_some()
    }
}

/// The stages an enabled backend runs, in order.
#[derive(Clone)]
pub struct Pipeline {
    kind: BackendKind,
    eligibility: EligibilityFilter,
    flights: FlightSelector,
    ads: AdSelector,
}

impl Pipeline {
    pub fn new(
        kind: BackendKind,
        eligibility: EligibilityFilter,
        flights: FlightSelector,
        ads: AdSelector,
    ) -> Self {
        Self {
            kind,
            eligibility,
            flights,
            ads,
        }
    }
}

#[derive(Clone)]
pub enum DecisionBackend {
    /// Never shows ads, e.g. for opted-out traffic.
    Disabled,
    Enabled(Pipeline),
}

impl DecisionBackend {
    pub fn new(
        kind: BackendKind,
        store: Arc<dyn FlightStore>,
        targeting: Arc<dyn TargetingPredicate>,
    ) -> Self {
        let (flight_policy, ad_policy) = match kind {
            BackendKind::Disabled => return Self::Disabled,
            BackendKind::Uniform => (FlightPolicy::Uniform, AdPolicy::Uniform),
            BackendKind::Probabilistic => (FlightPolicy::Tiered, AdPolicy::Weighted),
        };

        Self::Enabled(Pipeline::new(
            kind,
            EligibilityFilter::new(store),
            FlightSelector::new(flight_policy, targeting),
            AdSelector::new(ad_policy),
        ))
    }

    /// Backend for `config` using rule-based targeting.
    pub fn from_config(config: &AppConfig, store: Arc<dyn FlightStore>) -> Self {
        let backend = Self::new(
            config.decision.backend,
            store,
            Arc::new(RuleTargeting::new(&config.pacing)),
        );
        info!(
            backend = backend.kind().as_str(),
            pacing_interval_secs = config.pacing.interval_secs,
            "Decision backend initialized"
        );
        backend
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Disabled => BackendKind::Disabled,
            Self::Enabled(pipeline) => pipeline.kind,
        }
    }

    pub fn should_display_ads(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Choose an ad and the placement it fills.
    ///
    /// Only store failures are errors; no matching ad yields an unfilled
    /// decision.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        ctx: &TargetingContext,
        rng: &mut R,
    ) -> AdServerResult<Decision> {
        let decision_id = Uuid::new_v4();
        metrics::counter!("adserver.decisions", "backend" => self.kind().as_str()).increment(1);

        let pipeline = match self {
            Self::Disabled => return Ok(Decision::unfilled(decision_id)),
            Self::Enabled(pipeline) => pipeline,
        };

        let candidates = pipeline.eligibility.candidates(ctx)?;
        let candidate_count = candidates.len();

        let flight = pipeline.flights.select(candidates, ctx, rng);
        let advertisement = flight
            .as_deref()
            .and_then(|flight| pipeline.ads.select(flight, ctx, rng));

        let (Some(flight), Some(advertisement)) = (flight, advertisement) else {
            metrics::counter!("adserver.decisions.unfilled").increment(1);
            debug!(
                %decision_id,
                publisher = %ctx.publisher.slug,
                candidates = candidate_count,
                "No ad chosen"
            );
            return Ok(Decision::unfilled(decision_id));
        };

        let placement = resolve_placement(Some(&advertisement), ctx);
        if placement.is_none() {
            warn!(
                %decision_id,
                ad = %advertisement.slug,
                placements = ?ctx.placements,
                "Chosen ad fits none of the requested placements"
            );
            metrics::counter!("adserver.placement.unresolved").increment(1);
        }

        metrics::counter!("adserver.decisions.filled").increment(1);
        debug!(
            %decision_id,
            publisher = %ctx.publisher.slug,
            flight = %flight.slug,
            ad = %advertisement.slug,
            div_id = ?placement.as_ref().and_then(|p| p.div_id.as_deref()),
            candidates = candidate_count,
            "Ad chosen"
        );

        Ok(Decision {
            decision_id,
            advertisement: Some(advertisement),
            placement,
            flight_slug: Some(flight.slug.clone()),
        })
    }
}
