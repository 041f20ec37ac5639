//! Ad decision engine. Picks the flight and advertisement to serve for a
//! request, honoring targeting, campaign-type priority and delivery pacing.

pub mod ad;
pub mod backend;
pub mod context;
pub mod eligibility;
pub mod flight;
pub mod placement;
pub mod store;
pub mod targeting;
pub mod weighted;

#[cfg(test)]
mod testutil;

pub use ad::{AdPolicy, AdSelector};
pub use backend::{Decision, DecisionBackend, Pipeline};
pub use context::{DecisionRequest, ForcedSlug, TargetingContext};
pub use eligibility::{EligibilityFilter, FlightQuery};
pub use flight::{FlightPolicy, FlightSelector};
pub use placement::resolve_placement;
pub use store::{FlightStore, InMemoryFlightStore, InventorySnapshot};
pub use targeting::{RuleTargeting, TargetingPredicate};
pub use weighted::{choose_uniform, choose_weighted, WeightedCandidate, WeightedRanges};
