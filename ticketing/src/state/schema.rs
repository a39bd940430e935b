//! Column family definitions for the RocksDB store
//!
//! Each column family provides logical separation of data types
//! while sharing the same RocksDB instance.

/// Column family for tickets
pub const CF_TICKETS: &str = "tickets";

/// Column family for teams
pub const CF_TEAMS: &str = "teams";

/// Column family for team members
pub const CF_MEMBERS: &str = "members";

/// Column family for id counters and secondary indexes
pub const CF_META: &str = "meta";

/// Column family for event history
pub const CF_EVENTS: &str = "events";

/// All column family names
pub const ALL_CFS: &[&str] = &[CF_TICKETS, CF_TEAMS, CF_MEMBERS, CF_META, CF_EVENTS];

/// Key prefixes for compound keys
pub mod keys {
    /// Ticket key, zero-padded so iteration follows sequence order
    pub fn ticket(id: u64) -> String {
        format!("ticket:{:020}", id)
    }

    /// Team key
    pub fn team(id: u64) -> String {
        format!("team:{:020}", id)
    }

    /// Member key
    pub fn member(id: u64) -> String {
        format!("member:{:020}", id)
    }

    /// Unique email index entry
    pub fn member_email(email: &str) -> String {
        format!("email:{}", email)
    }

    /// Counter key for an id sequence ("ticket", "team", "member")
    pub fn sequence(kind: &str) -> String {
        format!("seq:{}", kind)
    }

    /// Create an event key (timestamp-based for ordering)
    pub fn event(timestamp_nanos: i64, event_id: &str) -> String {
        format!("evt:{:020}:{}", timestamp_nanos, event_id)
    }

    /// Parse event timestamp from key
    pub fn parse_event_timestamp(key: &str) -> Option<i64> {
        let parts: Vec<&str> = key.split(':').collect();
        if parts.len() >= 2 && parts[0] == "evt" {
            parts[1].parse().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        assert_eq!(keys::ticket(7), "ticket:00000000000000000007");
        assert_eq!(keys::member_email("a@x.io"), "email:a@x.io");
        assert_eq!(keys::sequence("ticket"), "seq:ticket");
    }

    #[test]
    fn test_ticket_key_ordering() {
        assert!(keys::ticket(9) < keys::ticket(10));
        assert!(keys::ticket(99) < keys::ticket(100));
    }

    #[test]
    fn test_parse_event_timestamp() {
        let key = keys::event(12345, "evt-1");
        assert_eq!(keys::parse_event_timestamp(&key), Some(12345));
        assert_eq!(keys::parse_event_timestamp("ticket:1"), None);
    }
}
