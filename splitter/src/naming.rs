use gtfs::Route;
use regex::Regex;

use crate::clean::clean_route_long_name;
use crate::{AgencyConfig, SplitError};

lazy_static::lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
    static ref COLOR: Regex = Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap();
}

/// The first run of digits in the feed's short name. "5A" and "5" both become "5".
pub fn route_short_name(route: &Route) -> Result<String, SplitError> {
    route
        .short_name
        .as_deref()
        .and_then(|x| DIGITS.find(x))
        .map(|m| m.as_str().trim_start_matches('0').to_string())
        .map(|x| if x.is_empty() { "0".to_string() } else { x })
        .ok_or_else(|| SplitError::UnexpectedRouteShortName {
            route: route.route_id.clone(),
            short_name: route.short_name.clone(),
        })
}

/// Prefers the feed's color, then the agency's table keyed by short name.
pub fn route_color(
    route: &Route,
    short_name: &str,
    config: &AgencyConfig,
) -> Result<String, SplitError> {
    if let Some(color) = route.color.as_ref().filter(|x| COLOR.is_match(x)) {
        return Ok(color.to_uppercase());
    }
    config
        .route_colors
        .get(short_name)
        .map(|x| x.to_uppercase())
        .ok_or_else(|| SplitError::UnregisteredRouteColor {
            route: route.route_id.clone(),
            short_name: short_name.to_string(),
        })
}

pub fn route_long_name(route: &Route) -> String {
    route
        .long_name
        .as_deref()
        .map(clean_route_long_name)
        .unwrap_or_default()
}
