use std::collections::HashMap;

use super::GoalUuid;

/// Goals the client currently wants feedback for.
///
/// Each entry caches the uuid's display string so filter rebuilds don't re-render.
/// Identifiers are unique: re-inserting refreshes the cached string.
#[derive(Debug, Default, Clone)]
pub struct GoalInterestSet {
    entries: HashMap<GoalUuid, String>,
}

impl GoalInterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the previous display string if the uuid was present.
    pub fn insert(&mut self, id: GoalUuid) -> Option<String> {
        self.entries.insert(id, id.to_display_string())
    }

    /// Remove; returns the released display string, or None if the uuid was absent.
    pub fn remove(&mut self, id: &GoalUuid) -> Option<String> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &GoalUuid) -> bool {
        self.entries.contains_key(id)
    }

    pub fn display_string(&self, id: &GoalUuid) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn uuids(&self) -> impl Iterator<Item = &GoalUuid> + '_ {
        self.entries.keys()
    }

    /// Remove every entry, yielding them (teardown).
    pub fn drain(&mut self) -> impl Iterator<Item = (GoalUuid, String)> + '_ {
        self.entries.drain()
    }

    /// Feedback content filter for the current membership.
    pub fn filter_expression(&self) -> String {
        feedback_filter_expression(self.entries.values().map(String::as_str))
    }
}

/// Build the feedback content filter from uuid display strings.
///
/// No strings yields the empty expression (no filtering). Otherwise one
/// `goal_id.uuid = &hex(<uuid>)` clause per string, joined with ` or `, in the
/// order given.
pub fn feedback_filter_expression<'a, I>(uuid_strings: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut filter = String::new();
    for uuid in uuid_strings {
        if !filter.is_empty() {
            filter.push_str(" or ");
        }
        filter.push_str("goal_id.uuid = &hex(");
        filter.push_str(uuid);
        filter.push(')');
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(b: u8) -> GoalUuid {
        GoalUuid::from_bytes([b; 16])
    }

    fn clauses(filter: &str) -> Vec<&str> {
        if filter.is_empty() {
            Vec::new()
        } else {
            filter.split(" or ").collect()
        }
    }

    #[test]
    fn empty_set_means_no_filter() {
        let set = GoalInterestSet::new();
        assert!(set.is_empty());
        assert_eq!(set.filter_expression(), "");
    }

    #[test]
    fn single_entry_has_no_separator() {
        let mut set = GoalInterestSet::new();
        set.insert(uuid(1));
        assert_eq!(
            set.filter_expression(),
            "goal_id.uuid = &hex(01010101-0101-0101-0101-010101010101)"
        );
    }

    #[test]
    fn one_clause_per_entry() {
        let mut set = GoalInterestSet::new();
        for b in 1..=4 {
            set.insert(uuid(b));
        }
        let filter = set.filter_expression();
        let parts = clauses(&filter);
        assert_eq!(parts.len(), 4);
        for b in 1..=4 {
            let clause = format!("goal_id.uuid = &hex({})", uuid(b));
            assert_eq!(parts.iter().filter(|c| **c == clause).count(), 1);
        }
    }

    #[test]
    fn reinsert_overwrites_without_duplicating() {
        let mut set = GoalInterestSet::new();
        assert_eq!(set.insert(uuid(9)), None);
        assert_eq!(set.insert(uuid(9)), Some(uuid(9).to_string()));
        assert_eq!(set.len(), 1);
        assert_eq!(clauses(&set.filter_expression()).len(), 1);
        assert_eq!(set.display_string(&uuid(9)), Some(uuid(9).to_string().as_str()));
    }

    #[test]
    fn remove_absent_reports_none() {
        let mut set = GoalInterestSet::new();
        set.insert(uuid(1));
        assert_eq!(set.remove(&uuid(2)), None);
        assert_eq!(set.len(), 1);
        assert!(set.remove(&uuid(1)).is_some());
        assert_eq!(set.filter_expression(), "");
    }

    #[test]
    fn drain_empties_the_set() {
        let mut set = GoalInterestSet::new();
        set.insert(uuid(1));
        set.insert(uuid(2));
        let drained: Vec<_> = set.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(set.is_empty());
    }

    #[test]
    fn builder_joins_in_given_order() {
        let filter = feedback_filter_expression(["a", "b"]);
        assert_eq!(filter, "goal_id.uuid = &hex(a) or goal_id.uuid = &hex(b)");
    }
}
