use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pacing::PacingCounters;
use crate::targeting::TargetingParameters;

/// Highest (least favoured) placement priority a publisher can request.
pub const MAX_PRIORITY: u8 = 10;
/// Lowest (most favoured) placement priority.
pub const MIN_PRIORITY: u8 = 1;

/// Campaign class. Declaration order is selection priority: paid flights are
/// always considered before affiliate, community and house flights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    Paid,
    Affiliate,
    Community,
    House,
}

impl CampaignType {
    pub const ALL: [CampaignType; 4] = [
        CampaignType::Paid,
        CampaignType::Affiliate,
        CampaignType::Community,
        CampaignType::House,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Affiliate => "affiliate",
            Self::Community => "community",
            Self::House => "house",
        }
    }
}

impl std::fmt::Display for CampaignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A site or project that displays ads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    pub slug: String,
    /// Keywords merged into every request from this publisher.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Slugs of the publisher groups this publisher belongs to.
    #[serde(default)]
    pub publisher_groups: Vec<String>,
    #[serde(default)]
    pub allow_paid_campaigns: bool,
    #[serde(default)]
    pub allow_affiliate_campaigns: bool,
    #[serde(default = "default_true")]
    pub allow_community_campaigns: bool,
    #[serde(default = "default_true")]
    pub allow_house_campaigns: bool,
}

impl Publisher {
    /// Whether the publisher's settings permit campaigns of this type.
    pub fn allows(&self, campaign_type: CampaignType) -> bool {
        match campaign_type {
            CampaignType::Paid => self.allow_paid_campaigns,
            CampaignType::Affiliate => self.allow_affiliate_campaigns,
            CampaignType::Community => self.allow_community_campaigns,
            CampaignType::House => self.allow_house_campaigns,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub campaign_type: CampaignType,
    /// Publishers this campaign runs on explicitly.
    #[serde(default)]
    pub publishers: Vec<String>,
    /// Publisher groups this campaign runs on.
    #[serde(default)]
    pub publisher_groups: Vec<String>,
    /// Publishers this campaign must never run on.
    #[serde(default)]
    pub exclude_publishers: Vec<String>,
}

impl Campaign {
    /// Listed for the publisher, directly or through a shared group, and not
    /// excluded.
    pub fn runs_on(&self, publisher: &Publisher) -> bool {
        if self.exclude_publishers.iter().any(|p| p == &publisher.slug) {
            return false;
        }
        self.publishers.iter().any(|p| p == &publisher.slug)
            || self
                .publisher_groups
                .iter()
                .any(|g| publisher.publisher_groups.contains(g))
    }
}

/// Resolved location of the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geolocation {
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub metro_code: Option<u32>,
}

/// A requested ad slot on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub ad_type: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub div_id: Option<String>,
}

fn default_priority() -> u8 {
    MIN_PRIORITY
}

impl Placement {
    pub fn new(ad_type: impl Into<String>, priority: u8) -> Self {
        Self {
            ad_type: ad_type.into(),
            priority,
            div_id: None,
        }
    }

    pub fn with_div_id(mut self, div_id: impl Into<String>) -> Self {
        self.div_id = Some(div_id.into());
        self
    }

    /// Copy with the priority forced into `MIN_PRIORITY..=MAX_PRIORITY`.
    pub fn clamped(&self) -> Self {
        Self {
            priority: self.priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            ..self.clone()
        }
    }

    /// Number of equal-weight entries an ad filling this slot receives.
    pub fn weight(&self) -> u64 {
        u64::from(MAX_PRIORITY + 1 - self.priority.clamp(MIN_PRIORITY, MAX_PRIORITY))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: Uuid,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    pub live: bool,
    /// Ad type slugs this creative can fill.
    pub ad_types: Vec<String>,
    /// Back-references filled in by [`Flight::link_advertisements`].
    #[serde(default)]
    pub flight_slug: String,
    #[serde(default)]
    pub campaign_slug: String,
}

impl Advertisement {
    pub fn has_ad_type(&self, ad_type: &str) -> bool {
        self.ad_types.iter().any(|t| t == ad_type)
    }

    pub fn matches_any_ad_type(&self, ad_types: &[String]) -> bool {
        ad_types.iter().any(|t| self.has_ad_type(t))
    }
}

/// A budgeted, targeted unit of delivery within a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    pub campaign: Campaign,
    pub live: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub targeting: TargetingParameters,
    #[serde(default)]
    pub pacing: PacingCounters,
    #[serde(default)]
    pub advertisements: Vec<Advertisement>,
}

impl Flight {
    pub fn campaign_type(&self) -> CampaignType {
        self.campaign.campaign_type
    }

    /// Point every advertisement back at this flight and its campaign.
    pub fn link_advertisements(&mut self) {
        for ad in &mut self.advertisements {
            ad.flight_slug.clone_from(&self.slug);
            ad.campaign_slug.clone_from(&self.campaign.slug);
        }
    }

    /// Live advertisements able to fill one of `ad_types`.
    pub fn live_ads_matching<'a>(
        &'a self,
        ad_types: &'a [String],
    ) -> impl Iterator<Item = &'a Advertisement> + 'a {
        self.advertisements
            .iter()
            .filter(move |ad| ad.live && ad.matches_any_ad_type(ad_types))
    }

    pub fn ads_with_slug<'a>(&'a self, slug: &'a str) -> impl Iterator<Item = &'a Advertisement> + 'a {
        self.advertisements.iter().filter(move |ad| ad.slug == slug)
    }

    /// Running on `today`: live and already started.
    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.live && self.start_date <= today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> Publisher {
        Publisher {
            slug: "readthedocs".to_string(),
            keywords: vec![],
            publisher_groups: vec!["docs".to_string()],
            allow_paid_campaigns: true,
            allow_affiliate_campaigns: false,
            allow_community_campaigns: true,
            allow_house_campaigns: true,
        }
    }

    fn campaign() -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            campaign_type: CampaignType::Paid,
            publishers: vec![],
            publisher_groups: vec![],
            exclude_publishers: vec![],
        }
    }

    #[test]
    fn test_campaign_type_priority_order() {
        let mut types = vec![
            CampaignType::House,
            CampaignType::Paid,
            CampaignType::Community,
            CampaignType::Affiliate,
        ];
        types.sort();
        assert_eq!(types, CampaignType::ALL.to_vec());
    }

    #[test]
    fn test_campaign_runs_on_publisher_or_group() {
        let publisher = publisher();
        let mut c = campaign();
        assert!(!c.runs_on(&publisher));

        c.publisher_groups = vec!["docs".to_string()];
        assert!(c.runs_on(&publisher));

        c.publisher_groups.clear();
        c.publishers = vec!["readthedocs".to_string()];
        assert!(c.runs_on(&publisher));

        c.exclude_publishers = vec!["readthedocs".to_string()];
        assert!(!c.runs_on(&publisher));
    }

    #[test]
    fn test_placement_weight() {
        assert_eq!(Placement::new("text", 1).weight(), 10);
        assert_eq!(Placement::new("text", 10).weight(), 1);
        // Out of range priorities are clamped, never underflow.
        assert_eq!(Placement::new("text", 42).weight(), 1);
        assert_eq!(Placement::new("text", 0).weight(), 10);
        assert_eq!(Placement::new("text", 0).clamped().priority, 1);
    }

    #[test]
    fn test_publisher_allows() {
        let publisher = publisher();
        assert!(publisher.allows(CampaignType::Paid));
        assert!(!publisher.allows(CampaignType::Affiliate));
        assert!(publisher.allows(CampaignType::House));
    }

    #[test]
    fn test_campaign_type_serde() {
        let json = serde_json::to_string(&CampaignType::Community).unwrap();
        assert_eq!(json, "\"community\"");
        let parsed: CampaignType = serde_json::from_str("\"house\"").unwrap();
        assert_eq!(parsed, CampaignType::House);
    }
}
