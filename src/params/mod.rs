//! Mapping caller search fields onto catalog query parameters and URLs

use crate::models::{SearchParameters, SearchRequest};

/// Layer the caller's fields over the default parameter template.
///
/// Values are forwarded as-is; the catalog decides what they mean.
pub fn map_parameters(request: &SearchRequest, defaults: &SearchParameters) -> SearchParameters {
    let mut params = defaults.clone();

    if let Some(card_name) = &request.card_name {
        params.card_name.clone_from(card_name);
    }
    if let Some(rarity) = &request.rarity {
        params.rarity.clone_from(rarity);
    }
    if let Some(foil) = &request.foil {
        params.foil.clone_from(foil);
    }

    params
}

/// Build a search URL whose query string is exactly `params`.
///
/// Any query already present on `base_url` is replaced.
pub fn build_search_url(base_url: &str, params: &SearchParameters) -> String {
    let base = base_url.split_once('?').map_or(base_url, |(path, _)| path);

    let query = params
        .query_pairs()
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{query}")
}

/// URL of the page carrying the set filter: the endpoint itself, untouched.
pub fn build_sets_url(base_url: &str) -> String {
    base_url.to_string()
}
