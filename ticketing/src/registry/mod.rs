//! Team and member registry
//!
//! Teams own at most one routing category; members belong to exactly one
//! team. Login/logout outside the engine drive a member's presence through
//! [`TeamRegistry::set_member_status`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DeskError, DeskResult, Entity};
use crate::events::{DeskEvent, SharedEventBus};
use crate::state::{
    CategoryLabel, Member, MemberDraft, MemberId, MemberStatus, SharedStore, Team, TeamId,
    TeamRoster,
};

/// A team declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSeed {
    pub name: String,
    #[serde(default)]
    pub category: Option<CategoryLabel>,
}

/// Registry operations over the shared store
pub struct TeamRegistry {
    store: SharedStore,
    events: Option<SharedEventBus>,
}

impl TeamRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            events: None,
        }
    }

    /// Announce registry changes on `bus`
    pub fn with_events(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    fn notify(&self, event: DeskEvent) {
        if let Some(bus) = &self.events {
            bus.notify(event);
        }
    }

    /// Create a team. Names are unique; a blank category means none.
    pub fn create_team(&self, name: &str, category: Option<&str>) -> DeskResult<Team> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeskError::validation("team name must not be empty"));
        }
        let category = normalize_category(category);

        let team = self
            .store
            .insert_team(name, category)
            .map_err(DeskError::from_store)?;

        info!(team_id = team.id, name = %team.name, category = ?team.category, "Team created");
        self.notify(DeskEvent::TeamCreated {
            team_id: team.id,
            name: team.name.clone(),
            category: team.category.clone(),
            timestamp: team.created_at,
        });
        Ok(team)
    }

    /// Make sure every seeded team exists.
    ///
    /// Missing teams are created. An existing team keeps its id; its
    /// category is updated when the seed names a different one. Running the
    /// same seeds twice changes nothing.
    pub fn seed_teams(&self, seeds: &[TeamSeed]) -> DeskResult<Vec<Team>> {
        let mut teams = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let category = normalize_category(seed.category.as_deref());
            let existing = self
                .store
                .find_team_by_name(seed.name.trim())
                .map_err(DeskError::from_store)?;

            let team = match existing {
                None => self.create_team(&seed.name, category)?,
                Some(team) if category.is_some() && team.category.as_deref() != category => {
                    self.set_team_category(team.id, category)?
                }
                Some(team) => {
                    debug!(team_id = team.id, name = %team.name, "Seeded team already present");
                    team
                }
            };
            teams.push(team);
        }
        Ok(teams)
    }

    /// Point a category at a different team, or clear it with `None`
    pub fn set_team_category(&self, team_id: TeamId, category: Option<&str>) -> DeskResult<Team> {
        let team = self
            .store
            .update_team_category(team_id, normalize_category(category))
            .map_err(DeskError::from_store)?;

        info!(team_id, category = ?team.category, "Team category changed");
        self.notify(DeskEvent::TeamCategoryChanged {
            team_id,
            category: team.category.clone(),
            timestamp: chrono::Utc::now(),
        });
        Ok(team)
    }

    /// Team with its members
    pub fn get_team(&self, team_id: TeamId) -> DeskResult<TeamRoster> {
        let team = self
            .store
            .get_team(team_id)?
            .ok_or_else(|| DeskError::not_found(Entity::Team, team_id))?;
        self.roster(team)
    }

    /// Team with its members, looked up by exact name
    pub fn find_team_by_name(&self, name: &str) -> DeskResult<TeamRoster> {
        let team = self
            .store
            .find_team_by_name(name)?
            .ok_or_else(|| DeskError::not_found(Entity::Team, name))?;
        self.roster(team)
    }

    /// All teams ordered by id
    pub fn list_teams(&self) -> DeskResult<Vec<Team>> {
        Ok(self.store.list_teams()?)
    }

    /// All teams with their members
    pub fn list_rosters(&self) -> DeskResult<Vec<TeamRoster>> {
        self.store
            .list_teams()?
            .into_iter()
            .map(|team| self.roster(team))
            .collect()
    }

    fn roster(&self, team: Team) -> DeskResult<TeamRoster> {
        let members = self.store.list_members(team.id)?;
        Ok(TeamRoster { team, members })
    }

    /// Register a member. New members start inactive with nothing solved.
    pub fn add_member(&self, draft: MemberDraft) -> DeskResult<Member> {
        let draft = MemberDraft {
            team_id: draft.team_id,
            name: required("name", &draft.name)?,
            email: required("email", &draft.email)?,
            role: required("role", &draft.role)?,
        };

        let member = self
            .store
            .insert_member(draft)
            .map_err(DeskError::from_store)?;

        info!(
            member_id = member.id,
            team_id = member.team_id,
            email = %member.email,
            "Member added"
        );
        self.notify(DeskEvent::MemberAdded {
            member_id: member.id,
            team_id: member.team_id,
            email: member.email.clone(),
            timestamp: member.created_at,
        });
        Ok(member)
    }

    pub fn get_member(&self, member_id: MemberId) -> DeskResult<Member> {
        self.store
            .get_member(member_id)?
            .ok_or_else(|| DeskError::not_found(Entity::Member, member_id))
    }

    pub fn find_member_by_email(&self, email: &str) -> DeskResult<Member> {
        self.store
            .find_member_by_email(email.trim())?
            .ok_or_else(|| DeskError::not_found(Entity::Member, email))
    }

    /// Mark a member active (login) or inactive (logout)
    pub fn set_member_status(
        &self,
        member_id: MemberId,
        status: MemberStatus,
    ) -> DeskResult<Member> {
        let member = self
            .store
            .set_member_status(member_id, status)
            .map_err(DeskError::from_store)?;

        info!(member_id, %status, "Member status changed");
        self.notify(DeskEvent::MemberStatusChanged {
            member_id,
            status,
            timestamp: chrono::Utc::now(),
        });
        Ok(member)
    }
}

fn normalize_category(category: Option<&str>) -> Option<&str> {
    category.map(str::trim).filter(|c| !c.is_empty())
}

fn required(field: &str, value: &str) -> DeskResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DeskError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::state::MemoryStore;
    use std::sync::Arc;

    fn registry() -> TeamRegistry {
        TeamRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn draft(team_id: TeamId, email: &str) -> MemberDraft {
        MemberDraft {
            team_id,
            name: "Dana".to_string(),
            email: email.to_string(),
            role: "agent".to_string(),
        }
    }

    #[test]
    fn test_create_team_rejects_duplicates_and_blanks() {
        let registry = registry();
        let team = registry.create_team("Finance", Some("Billing")).unwrap();
        assert_eq!(team.category.as_deref(), Some("Billing"));

        assert!(matches!(
            registry.create_team("Finance", None),
            Err(DeskError::DuplicateTeam { .. })
        ));
        assert!(matches!(
            registry.create_team("   ", None),
            Err(DeskError::Validation { .. })
        ));

        let blank_category = registry.create_team("Couriers", Some(" ")).unwrap();
        assert_eq!(blank_category.category, None);
    }

    #[test]
    fn test_seed_teams_is_idempotent() {
        let registry = registry();
        let seeds = vec![
            TeamSeed {
                name: "Finance".to_string(),
                category: Some("Billing".to_string()),
            },
            TeamSeed {
                name: "Other".to_string(),
                category: None,
            },
        ];

        let first = registry.seed_teams(&seeds).unwrap();
        let second = registry.seed_teams(&seeds).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.list_teams().unwrap().len(), 2);
    }

    #[test]
    fn test_seed_updates_changed_category() {
        let registry = registry();
        let original = registry.create_team("Finance", Some("Payments")).unwrap();

        let seeded = registry
            .seed_teams(&[TeamSeed {
                name: "Finance".to_string(),
                category: Some("Billing".to_string()),
            }])
            .unwrap();
        assert_eq!(seeded[0].id, original.id);
        assert_eq!(seeded[0].category.as_deref(), Some("Billing"));
    }

    #[test]
    fn test_add_member_defaults_and_constraints() {
        let registry = registry();
        let team = registry.create_team("Finance", Some("Billing")).unwrap();

        let member = registry.add_member(draft(team.id, " dana@desk.io ")).unwrap();
        assert_eq!(member.email, "dana@desk.io");
        assert_eq!(member.status, MemberStatus::Inactive);
        assert_eq!(member.solved_count, 0);

        assert!(matches!(
            registry.add_member(draft(team.id, "dana@desk.io")),
            Err(DeskError::DuplicateEmail { .. })
        ));
        assert!(matches!(
            registry.add_member(draft(99, "x@desk.io")),
            Err(DeskError::NotFound {
                entity: Entity::Team,
                ..
            })
        ));
        assert!(matches!(
            registry.add_member(draft(team.id, "")),
            Err(DeskError::Validation { .. })
        ));
    }

    #[test]
    fn test_roster_lookups() {
        let registry = registry();
        let finance = registry.create_team("Finance", Some("Billing")).unwrap();
        let couriers = registry.create_team("Couriers", Some("Delivery")).unwrap();
        registry.add_member(draft(finance.id, "a@desk.io")).unwrap();
        registry.add_member(draft(finance.id, "b@desk.io")).unwrap();
        registry.add_member(draft(couriers.id, "c@desk.io")).unwrap();

        let roster = registry.find_team_by_name("Finance").unwrap();
        assert_eq!(roster.members.len(), 2);
        assert_eq!(registry.get_team(couriers.id).unwrap().members.len(), 1);

        let rosters = registry.list_rosters().unwrap();
        assert_eq!(rosters.len(), 2);
        assert_eq!(rosters[0].team.name, "Finance");

        assert!(matches!(
            registry.find_team_by_name("finance"),
            Err(DeskError::NotFound { .. })
        ));
        assert_eq!(
            registry.find_member_by_email("c@desk.io").unwrap().team_id,
            couriers.id
        );
    }

    #[tokio::test]
    async fn test_status_toggle_publishes_event() {
        let bus = EventBus::new().shared();
        let mut receiver = bus.subscribe();
        let registry = registry().with_events(bus);

        let team = registry.create_team("Finance", None).unwrap();
        let member = registry.add_member(draft(team.id, "a@desk.io")).unwrap();
        let member = registry
            .set_member_status(member.id, MemberStatus::Active)
            .unwrap();
        assert_eq!(member.status, MemberStatus::Active);

        let types: Vec<&str> = [
            receiver.recv().await.unwrap(),
            receiver.recv().await.unwrap(),
            receiver.recv().await.unwrap(),
        ]
        .iter()
        .map(DeskEvent::event_type)
        .collect();
        assert_eq!(types, ["team_created", "member_added", "member_status_changed"]);

        assert!(matches!(
            registry.set_member_status(42, MemberStatus::Inactive),
            Err(DeskError::NotFound {
                entity: Entity::Member,
                ..
            })
        ));
    }
}
