//! Country picker logic: loading, searching and suggestion lists.

use tracing::warn;

use crate::services::country_api::{CountryApi, CountrySummary};

/// How many suggestions the search box offers.
pub const SUGGESTION_LIMIT: usize = 7;

/// Offered when the country provider cannot be reached.
pub fn fallback_countries() -> Vec<CountrySummary> {
    vec![
        CountrySummary::new("Sri Lanka", "Colombo", 21_919_000),
        CountrySummary::new("United States", "Washington D.C.", 331_900_000),
        CountrySummary::new("India", "New Delhi", 1_380_000_000),
    ]
}

/// The provider's list, or [`fallback_countries`] if it fails.
pub async fn load_countries(api: &dyn CountryApi) -> Vec<CountrySummary> {
    match api.list_countries().await {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "Country list unavailable, using fallback list");
            fallback_countries()
        }
    }
}

/// Countries whose name or capital contains `term`, ignoring case. A blank
/// term matches everything.
pub fn filter_countries<'a>(countries: &'a [CountrySummary], term: &str) -> Vec<&'a CountrySummary> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return countries.iter().collect();
    }
    countries
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&term) || c.capital.to_lowercase().contains(&term))
        .collect()
}

/// The first [`SUGGESTION_LIMIT`] matches; nothing for a blank term.
pub fn suggestions<'a>(countries: &'a [CountrySummary], term: &str) -> Vec<&'a CountrySummary> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    let mut matches = filter_countries(countries, term);
    matches.truncate(SUGGESTION_LIMIT);
    matches
}

/// Case-insensitive full-name match.
pub fn find_exact<'a>(countries: &'a [CountrySummary], term: &str) -> Option<&'a CountrySummary> {
    let term = term.trim().to_lowercase();
    countries.iter().find(|c| c.name.to_lowercase() == term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::country_api::CountryMetadata;

    struct Offline;

    #[async_trait::async_trait]
    impl CountryApi for Offline {
        async fn list_countries(&self) -> anyhow::Result<Vec<CountrySummary>> {
            anyhow::bail!("offline")
        }

        async fn country_details(&self, _name: &str) -> anyhow::Result<CountryMetadata> {
            anyhow::bail!("offline")
        }
    }

    #[tokio::test]
    async fn test_fallback_list_on_failure() {
        let list = load_countries(&Offline).await;
        assert_eq!(list, fallback_countries());
    }

    #[test]
    fn test_filter_matches_capital() {
        let list = fallback_countries();
        let names: Vec<_> = filter_countries(&list, "DELHI").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["India"]);
        assert_eq!(filter_countries(&list, "  ").len(), 3);
    }

    #[test]
    fn test_suggestions_are_capped() {
        let list: Vec<_> = (0..20)
            .map(|i| CountrySummary::new(&format!("Land {i}"), "Town", 1))
            .collect();
        assert_eq!(suggestions(&list, "land").len(), SUGGESTION_LIMIT);
        assert!(suggestions(&list, "").is_empty());
    }

    #[test]
    fn test_find_exact() {
        let list = fallback_countries();
        assert_eq!(find_exact(&list, " sri lanka ").map(|c| c.capital.as_str()), Some("Colombo"));
        assert!(find_exact(&list, "Sri").is_none());
    }
}
