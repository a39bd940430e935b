//! Category → team routing
//!
//! Lookup is a single exact match on the teams' `category` field. Team names
//! are never matched, and a category nobody owns routes to the fallback team.

use std::collections::BTreeMap;

use crate::state::{CategoryLabel, Team, FALLBACK_TEAM};

/// Deterministic mapping from category label to owning team name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    routes: BTreeMap<CategoryLabel, String>,
    fallback: String,
}

impl RoutingTable {
    /// Empty table: every category routes to `fallback`
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            routes: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Build from the registry's teams.
    ///
    /// When several teams declare the same category, the one with the lowest
    /// id owns it.
    pub fn from_teams(teams: &[Team], fallback: impl Into<String>) -> Self {
        let mut ordered: Vec<&Team> = teams.iter().collect();
        ordered.sort_by_key(|t| t.id);

        let mut table = Self::new(fallback);
        for team in ordered {
            if let Some(category) = &team.category {
                table
                    .routes
                    .entry(category.clone())
                    .or_insert_with(|| team.name.clone());
            }
        }
        table
    }

    /// Owning team for a category. Total: never fails.
    pub fn route(&self, category: &str) -> &str {
        self.routes
            .get(category)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// Whether some team owns this category
    pub fn is_routed(&self, category: &str) -> bool {
        self.routes.contains_key(category)
    }

    /// Team receiving every unowned category
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// (category, team) pairs in category order
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(c, t)| (c.as_str(), t.as_str()))
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new(FALLBACK_TEAM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u64, name: &str, category: Option<&str>) -> Team {
        Team::new(id, name.to_string(), category.map(str::to_string))
    }

    #[test]
    fn test_exact_category_match() {
        let table = RoutingTable::from_teams(
            &[
                team(1, "Finance", Some("Billing")),
                team(2, "Couriers", Some("Delivery")),
            ],
            FALLBACK_TEAM,
        );
        assert_eq!(table.route("Billing"), "Finance");
        assert_eq!(table.route("Delivery"), "Couriers");
    }

    #[test]
    fn test_unmatched_category_falls_back() {
        let table = RoutingTable::from_teams(&[team(1, "Finance", Some("Billing"))], "Other");
        assert_eq!(table.route("Shipping"), "Other");
        assert_eq!(table.route(""), "Other");
        assert!(!table.is_routed("Shipping"));
        assert_eq!(table.fallback(), "Other");
    }

    #[test]
    fn test_team_name_is_not_a_route() {
        let table = RoutingTable::from_teams(&[team(1, "Billing", None)], "Other");
        assert_eq!(table.route("Billing"), "Other");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let table = RoutingTable::from_teams(&[team(1, "Finance", Some("Billing"))], "Other");
        assert_eq!(table.route("billing"), "Other");
    }

    #[test]
    fn test_lowest_team_id_wins_duplicate_category() {
        let table = RoutingTable::from_teams(
            &[
                team(5, "Late Finance", Some("Billing")),
                team(2, "Early Finance", Some("Billing")),
            ],
            "Other",
        );
        assert_eq!(table.route("Billing"), "Early Finance");
        assert_eq!(table.routes().count(), 1);
    }
}
