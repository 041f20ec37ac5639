pub mod config;
pub mod countries;
pub mod error;
pub mod pacing;
pub mod targeting;
pub mod types;

pub use config::{AppConfig, BackendKind};
pub use error::{AdServerError, AdServerResult};
pub use pacing::PacingCounters;
pub use targeting::{validate_targeting, MobileTraffic, TargetingParameters, ValidationError};
pub use types::{
    Advertisement, Campaign, CampaignType, Flight, Geolocation, Placement, Publisher,
    MAX_PRIORITY, MIN_PRIORITY,
};
