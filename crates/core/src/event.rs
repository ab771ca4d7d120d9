use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One structured row derived from a Windows security audit log entry.
///
/// Field names on the wire follow the converted-export column names of the
/// upstream XML parser, so JSON-lines dumps of the converted tables
/// deserialize directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "SYSTEM_TimeCreated")]
    pub ts: DateTime<Utc>,
    #[serde(rename = "SYSTEM_EventID")]
    pub event_id: String,
    #[serde(rename = "EVENTDATA_ProcessName")]
    pub process_name: String,
    #[serde(rename = "EVENTDATA_ObjectName")]
    pub object_name: String,
    /// May carry multiple access-type codes, e.g. `"%%4417,%%1537"`.
    #[serde(rename = "EVENTDATA_AccessList")]
    pub access_list: String,
    #[serde(rename = "EVENTDATA_SubjectUserName")]
    pub subject_user: String,
}

impl AuditEvent {
    /// Access-list containment: a row matches an expected access type when
    /// the token appears as a substring of its (possibly multi-valued)
    /// access list.
    pub fn access_list_contains(&self, access_type: &str) -> bool {
        self.access_list.contains(access_type)
    }
}

/// Ordered in-memory collection of audit events for one iteration,
/// pre-sorted by timestamp. Owned exclusively by the dispatch call that
/// evaluates the iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTable {
    events: Vec<AuditEvent>,
}

impl EventTable {
    pub fn new(mut events: Vec<AuditEvent>) -> Self {
        events.sort_by(|a, b| a.ts.cmp(&b.ts));
        Self { events }
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first_ts(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.ts)
    }

    pub fn last_ts(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.ts)
    }

    /// Copy out the rows inside `[start, end]`, both bounds inclusive.
    pub fn slice_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> EventTable {
        let events = self
            .events
            .iter()
            .filter(|e| e.ts >= start && e.ts <= end)
            .cloned()
            .collect();
        EventTable { events }
    }

    /// Restrict the table to rows of one simulation user.
    pub fn retain_user(&mut self, subject_user: &str) {
        self.events.retain(|e| e.subject_user == subject_user);
    }

    /// Cross-iteration continuity: events of an iteration can bleed into the
    /// first archived file of the following iteration or run. Append that
    /// chunk, restore chronological order and truncate to the current
    /// iteration's end bound.
    pub fn append_continuation(&mut self, next: EventTable, end: DateTime<Utc>) {
        self.events.extend(next.events);
        self.events.sort_by(|a, b| a.ts.cmp(&b.ts));
        self.events.retain(|e| e.ts <= end);
    }
}

impl FromIterator<AuditEvent> for EventTable {
    fn from_iter<I: IntoIterator<Item = AuditEvent>>(iter: I) -> Self {
        EventTable::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_at(secs: u32, user: &str) -> AuditEvent {
        AuditEvent {
            ts: Utc.with_ymd_and_hms(2023, 12, 26, 20, 0, secs).unwrap(),
            event_id: "4663".to_string(),
            process_name: "C:\\Windows\\System32\\xcopy.exe".to_string(),
            object_name: "C:\\localstorage\\sim23_dest\\a.dat".to_string(),
            access_list: "%%4417".to_string(),
            subject_user: user.to_string(),
        }
    }

    #[test]
    fn slice_window_bounds_are_inclusive() {
        let table = EventTable::new(vec![
            event_at(1, "SimUser001"),
            event_at(2, "SimUser001"),
            event_at(3, "SimUser001"),
        ]);
        let start = Utc.with_ymd_and_hms(2023, 12, 26, 20, 0, 1).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 12, 26, 20, 0, 2).unwrap();

        let slice = table.slice_window(start, end);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.first_ts(), Some(start));
        assert_eq!(slice.last_ts(), Some(end));
    }

    #[test]
    fn retain_user_drops_other_users() {
        let mut table = EventTable::new(vec![
            event_at(1, "SimUser001"),
            event_at(2, "SimUser002"),
            event_at(3, "SimUser001"),
        ]);
        table.retain_user("SimUser001");
        assert_eq!(table.len(), 2);
        assert!(table.events().iter().all(|e| e.subject_user == "SimUser001"));
    }

    #[test]
    fn append_continuation_sorts_and_truncates() {
        let mut table = EventTable::new(vec![event_at(5, "SimUser001")]);
        let next = EventTable::new(vec![event_at(3, "SimUser001"), event_at(30, "SimUser001")]);
        let end = Utc.with_ymd_and_hms(2023, 12, 26, 20, 0, 10).unwrap();

        table.append_continuation(next, end);
        // the late row of the next chunk falls outside the iteration bound
        assert_eq!(table.len(), 2);
        assert!(table.events().windows(2).all(|w| w[0].ts <= w[1].ts));
    }

    #[test]
    fn new_sorts_unordered_input() {
        let table = EventTable::new(vec![event_at(9, "u"), event_at(1, "u"), event_at(4, "u")]);
        assert!(table.events().windows(2).all(|w| w[0].ts <= w[1].ts));
    }
}
