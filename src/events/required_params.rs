//! Static required-parameter tables for event validation.
//!
//! GA4 ecommerce events use snake_case names; Meta Pixel standard events use
//! PascalCase. An event whose name appears here must carry every listed
//! parameter for downstream reporting to attribute revenue correctly.

use crate::models::EventPlatform;

/// Required parameters for GA4 ecommerce events, by snake_case name.
pub const GA4_REQUIRED_PARAMS: &[(&str, &[&str])] = &[
    ("purchase", &["transaction_id", "value", "currency"]),
    ("refund", &["transaction_id"]),
    ("add_to_cart", &["currency", "value"]),
    ("begin_checkout", &["currency", "value"]),
    ("add_payment_info", &["currency", "value"]),
    ("view_item", &["currency", "value"]),
];

/// Required parameters for Meta Pixel standard events, by PascalCase name.
pub const META_PIXEL_REQUIRED_PARAMS: &[(&str, &[&str])] = &[
    ("Purchase", &["value", "currency"]),
    ("Subscribe", &["value", "currency"]),
    ("StartTrial", &["value", "currency"]),
];

/// Looks up the required parameters for one event.
///
/// GA4 records consult the snake_case table, Meta Pixel records the
/// PascalCase table. GTM dataLayer events carry nested ecommerce payloads
/// whose shape GTM itself defines, so they are not validated here.
pub fn required_params_for(platform: EventPlatform, name: &str) -> Option<&'static [&'static str]> {
    let table = match platform {
        EventPlatform::Ga4 => GA4_REQUIRED_PARAMS,
        EventPlatform::MetaPixel => META_PIXEL_REQUIRED_PARAMS,
        EventPlatform::Gtm => return None,
    };
    table
        .iter()
        .find(|(event_name, _)| *event_name == name)
        .map(|(_, params)| *params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_platform_and_name() {
        assert_eq!(
            required_params_for(EventPlatform::Ga4, "purchase"),
            Some(&["transaction_id", "value", "currency"][..])
        );
        assert_eq!(
            required_params_for(EventPlatform::MetaPixel, "Purchase"),
            Some(&["value", "currency"][..])
        );
        // Case matters: names are platform conventions
        assert_eq!(required_params_for(EventPlatform::Ga4, "Purchase"), None);
        assert_eq!(required_params_for(EventPlatform::Gtm, "purchase"), None);
    }
}
