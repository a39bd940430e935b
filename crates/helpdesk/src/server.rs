//! MCP tool server
//!
//! Each tool maps onto one engine operation. Successful calls return the
//! affected records as pretty JSON; failures return a [`StructuredError`]
//! document so callers can branch on `code` and follow `recovery_action`.
//!
//! [`StructuredError`]: ticketing::StructuredError

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use ticketing::state::{
    MemberDraft, MemberId, MemberStatus, TeamId, TicketFilter, TicketId, TicketStatus,
};
use ticketing::{DeskError, Entity};

use crate::desk::Desk;

// ============================================================================
// Request Types
// ============================================================================

/// MCP request for ingest tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngestRequest {
    #[schemars(description = "Channel identity of the sender, e.g. 'whatsapp:+15550001'")]
    pub sender_id: String,
    #[schemars(description = "Message text, stored verbatim")]
    pub text: String,
}

/// MCP request for list_queries tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListQueriesRequest {
    #[schemars(description = "Only tickets routed to this team name")]
    pub team: Option<String>,
    #[schemars(description = "Only tickets assigned to this member id")]
    pub assignee: Option<MemberId>,
    #[schemars(description = "Only tickets in this status: pending, in_progress, or solved")]
    pub status: Option<String>,
    #[schemars(description = "Only tickets with this category label")]
    pub category: Option<String>,
}

/// MCP request for pick and resolve tools
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TransitionRequest {
    #[schemars(description = "Ticket sequence number")]
    pub ticket_id: TicketId,
    #[schemars(description = "Id of the member performing the action")]
    pub member_id: MemberId,
}

/// MCP request for list_teams tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListTeamsRequest {
    #[schemars(description = "Include each team's members (default: true)")]
    pub include_members: Option<bool>,
}

/// MCP request for create_team tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateTeamRequest {
    #[schemars(description = "Unique team name")]
    pub name: String,
    #[schemars(description = "Category label routed to this team")]
    pub category: Option<String>,
}

/// MCP request for set_team_category tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetTeamCategoryRequest {
    pub team_id: TeamId,
    #[schemars(description = "New category label; omit to stop routing to this team")]
    pub category: Option<String>,
}

/// MCP request for add_member tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMemberRequest {
    pub team_id: TeamId,
    pub name: String,
    #[schemars(description = "Unique email address")]
    pub email: String,
    pub role: String,
}

/// MCP request for get_member tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GetMemberRequest {
    pub member_id: Option<MemberId>,
    #[schemars(description = "Look up by email when member_id is omitted")]
    pub email: Option<String>,
}

/// MCP request for set_member_status tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetMemberStatusRequest {
    pub member_id: MemberId,
    #[schemars(description = "'active' on login, 'inactive' on logout")]
    pub status: String,
}

/// MCP request for team_queue tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TeamQueueRequest {
    #[schemars(description = "Member whose team queue to list")]
    pub member_id: MemberId,
}

/// MCP request for my_tasks tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MyTasksRequest {
    pub member_id: MemberId,
    #[schemars(description = "in_progress (default) or solved")]
    pub status: Option<String>,
}

/// MCP request for ticket_history tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TicketHistoryRequest {
    pub ticket_id: TicketId,
}

/// MCP request for recent_events tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct RecentEventsRequest {
    #[schemars(description = "Look-back window in minutes (default: 60)")]
    pub minutes: Option<i64>,
}

// ============================================================================
// Server
// ============================================================================

/// The MCP server handler
#[derive(Clone)]
pub struct DeskServer {
    desk: Desk,
    tool_router: ToolRouter<Self>,
}

impl DeskServer {
    pub fn new(desk: Desk) -> Self {
        Self {
            desk,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

fn fail(err: DeskError) -> String {
    tracing::debug!(code = err.code(), "Tool call rejected: {}", err);
    err.to_structured().to_json()
}

fn parse_status(raw: &str) -> Result<TicketStatus, String> {
    raw.parse().map_err(|e: String| fail(DeskError::validation(e)))
}

#[tool_router]
impl DeskServer {
    #[tool(
        description = "Create a ticket from an inbound message. The message is classified, routed to the team owning its category (or 'Other'), and stored as pending. Returns the ticket id and the acknowledgement to send back to the sender."
    )]
    pub async fn ingest(
        &self,
        Parameters(req): Parameters<IngestRequest>,
    ) -> Result<String, String> {
        let receipt = self
            .desk
            .intake
            .ingest(&req.sender_id, &req.text)
            .await
            .map_err(fail)?;
        to_json(&receipt)
    }

    #[tool(
        description = "List tickets. All filters are optional and combine with AND; results are ordered by ticket id."
    )]
    pub async fn list_queries(
        &self,
        Parameters(req): Parameters<ListQueriesRequest>,
    ) -> Result<String, String> {
        let filter = TicketFilter {
            team: req.team,
            assignee: req.assignee,
            status: req.status.as_deref().map(parse_status).transpose()?,
            category: req.category,
        };
        let tickets = self.desk.assignment.list_queries(&filter).map_err(fail)?;
        to_json(&tickets)
    }

    #[tool(
        description = "Claim a pending ticket. Fails with ALREADY_ASSIGNED if anyone (including you) already holds it."
    )]
    pub async fn pick(
        &self,
        Parameters(req): Parameters<TransitionRequest>,
    ) -> Result<String, String> {
        let ticket = self
            .desk
            .assignment
            .pick(req.ticket_id, req.member_id)
            .map_err(fail)?;
        to_json(&ticket)
    }

    #[tool(
        description = "Mark a ticket you picked as solved and credit it to you. Only the assignee of an in-progress ticket can resolve it."
    )]
    pub async fn resolve(
        &self,
        Parameters(req): Parameters<TransitionRequest>,
    ) -> Result<String, String> {
        let ticket = self
            .desk
            .assignment
            .resolve(req.ticket_id, req.member_id)
            .map_err(fail)?;
        to_json(&ticket)
    }

    #[tool(description = "List the configured query categories.")]
    pub async fn list_categories(&self) -> Result<String, String> {
        to_json(&self.desk.categories.labels())
    }

    #[tool(
        description = "List teams with the category each one shows (its routing category, or its name when it has none) and, optionally, its members."
    )]
    pub async fn list_teams(
        &self,
        Parameters(req): Parameters<ListTeamsRequest>,
    ) -> Result<String, String> {
        let include_members = req.include_members.unwrap_or(true);
        let rosters = self.desk.registry.list_rosters().map_err(fail)?;
        let teams: Vec<serde_json::Value> = rosters
            .iter()
            .map(|roster| {
                let mut team = json!({
                    "id": roster.team.id,
                    "name": roster.team.name,
                    "category": roster.team.display_category(),
                    "routes_category": roster.team.category,
                    "member_count": roster.members.len(),
                });
                if include_members {
                    team["members"] = json!(roster.members);
                }
                team
            })
            .collect();
        to_json(&teams)
    }

    #[tool(description = "Create a team, optionally owning a routing category.")]
    pub async fn create_team(
        &self,
        Parameters(req): Parameters<CreateTeamRequest>,
    ) -> Result<String, String> {
        let team = self
            .desk
            .registry
            .create_team(&req.name, req.category.as_deref())
            .map_err(fail)?;
        to_json(&team)
    }

    #[tool(
        description = "Change which category routes to a team. Applies to tickets ingested afterwards; existing tickets keep their team."
    )]
    pub async fn set_team_category(
        &self,
        Parameters(req): Parameters<SetTeamCategoryRequest>,
    ) -> Result<String, String> {
        let team = self
            .desk
            .registry
            .set_team_category(req.team_id, req.category.as_deref())
            .map_err(fail)?;
        to_json(&team)
    }

    #[tool(
        description = "Add a member to a team. Emails are unique; new members start inactive with zero solved tickets."
    )]
    pub async fn add_member(
        &self,
        Parameters(req): Parameters<AddMemberRequest>,
    ) -> Result<String, String> {
        let member = self
            .desk
            .registry
            .add_member(MemberDraft {
                team_id: req.team_id,
                name: req.name,
                email: req.email,
                role: req.role,
            })
            .map_err(fail)?;
        to_json(&member)
    }

    #[tool(description = "Look up a member by id or by email.")]
    pub async fn get_member(
        &self,
        Parameters(req): Parameters<GetMemberRequest>,
    ) -> Result<String, String> {
        let member = match (req.member_id, req.email.as_deref()) {
            (Some(id), _) => self.desk.registry.get_member(id),
            (None, Some(email)) => self.desk.registry.find_member_by_email(email),
            (None, None) => Err(DeskError::validation("member_id or email is required")),
        }
        .map_err(fail)?;
        to_json(&member)
    }

    #[tool(description = "Set a member active (login) or inactive (logout).")]
    pub async fn set_member_status(
        &self,
        Parameters(req): Parameters<SetMemberStatusRequest>,
    ) -> Result<String, String> {
        let status: MemberStatus = req
            .status
            .parse()
            .map_err(|e: String| fail(DeskError::validation(e)))?;
        let member = self
            .desk
            .registry
            .set_member_status(req.member_id, status)
            .map_err(fail)?;
        to_json(&member)
    }

    #[tool(description = "List the unassigned tickets waiting in the member's own team queue.")]
    pub async fn team_queue(
        &self,
        Parameters(req): Parameters<TeamQueueRequest>,
    ) -> Result<String, String> {
        let tickets = self
            .desk
            .assignment
            .queue_for_member(req.member_id)
            .map_err(fail)?;
        to_json(&tickets)
    }

    #[tool(description = "List tickets held by a member, in progress by default or solved.")]
    pub async fn my_tasks(
        &self,
        Parameters(req): Parameters<MyTasksRequest>,
    ) -> Result<String, String> {
        let status = match req.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => TicketStatus::InProgress,
        };
        self.desk.registry.get_member(req.member_id).map_err(fail)?;
        let tickets = self
            .desk
            .assignment
            .member_tasks(req.member_id, status)
            .map_err(fail)?;
        to_json(&tickets)
    }

    #[tool(description = "Replay the recorded events of one ticket, oldest first.")]
    pub async fn ticket_history(
        &self,
        Parameters(req): Parameters<TicketHistoryRequest>,
    ) -> Result<String, String> {
        self.desk
            .store
            .get_ticket(req.ticket_id)
            .map_err(|e| fail(DeskError::from_store(e)))?
            .ok_or_else(|| fail(DeskError::not_found(Entity::Ticket, req.ticket_id)))?;
        let events = self
            .desk
            .history()
            .ticket_events(req.ticket_id)
            .map_err(|e| fail(e.into()))?;
        to_json(&events)
    }

    #[tool(description = "Desk activity (tickets, picks, resolves, registry changes) from the last N minutes.")]
    pub async fn recent_events(
        &self,
        Parameters(req): Parameters<RecentEventsRequest>,
    ) -> Result<String, String> {
        let minutes = req.minutes.unwrap_or(60);
        if minutes <= 0 {
            return Err(fail(DeskError::validation("minutes must be positive")));
        }
        let events = self
            .desk
            .history()
            .get_recent_events(minutes)
            .map_err(|e| fail(e.into()))?;
        to_json(&events)
    }
}

#[tool_handler]
impl ServerHandler for DeskServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = "Helpdesk ticket engine.\n\
                 - ingest: turn an inbound message into a routed, pending ticket\n\
                 - team_queue / list_queries: find work; pick: claim a ticket\n\
                 - resolve: close a ticket you picked (credits your solved count)\n\
                 - my_tasks: your in-progress or solved tickets\n\
                 - ticket_history / recent_events: replay recorded activity\n\
                 - list_teams, create_team, set_team_category, add_member, get_member, set_member_status: registry\n\
                 \n\
                 Errors are JSON with `code`, `message`, and `recovery_action`. \
                 Only PERSISTENCE_ERROR is worth retrying unchanged.";

        ServerInfo {
            instructions: Some(instructions.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
