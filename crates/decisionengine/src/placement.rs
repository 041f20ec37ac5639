use adserver_core::types::{Advertisement, Placement};

use crate::context::TargetingContext;

/// The first requested placement `advertisement` can fill.
///
/// Placement order is the caller's and is significant. Without an
/// advertisement a lone placement is returned as is, so unfilled requests
/// can still be attributed to a slot.
pub fn resolve_placement(
    advertisement: Option<&Advertisement>,
    ctx: &TargetingContext,
) -> Option<Placement> {
    let Some(ad) = advertisement else {
        return match ctx.placements.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
    };

    ctx.placements
        .iter()
        .find(|placement| {
            ad.has_ad_type(&placement.ad_type)
                && ctx.ad_slug.as_ref().map_or(true, |slug| &ad.slug == slug)
                && ctx
                    .campaign_slug
                    .as_ref()
                    .map_or(true, |slug| &ad.campaign_slug == slug)
        })
        .cloned()
}
