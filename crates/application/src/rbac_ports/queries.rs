use rolegate_domain::GuardName;

/// Upper bound applied to list page sizes.
pub const MAX_LIST_LIMIT: usize = 500;

/// Filter and pagination for role and permission listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListQuery {
    /// Restricts results to one guard.
    pub guard: Option<GuardName>,
    /// Case-insensitive match against id, name or guard.
    pub search: Option<String>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl RecordListQuery {
    /// Returns a copy with the limit clamped and blank search text dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            guard: self.guard,
            search: self
                .search
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            limit: self.limit.clamp(1, MAX_LIST_LIMIT),
            offset: self.offset,
        }
    }

    /// Returns whether a record with the given id, name and guard matches the search text.
    #[must_use]
    pub fn matches_search(&self, id: &str, name: &str, guard: &str) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };

        let needle = search.to_lowercase();
        [id, name, guard]
            .iter()
            .any(|value| value.to_lowercase().contains(needle.as_str()))
    }
}

impl Default for RecordListQuery {
    fn default() -> Self {
        Self {
            guard: None,
            search: None,
            limit: 100,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_LIST_LIMIT, RecordListQuery};

    #[test]
    fn normalized_clamps_limit_and_drops_blank_search() {
        let query = RecordListQuery {
            search: Some("   ".to_owned()),
            limit: 10_000,
            ..RecordListQuery::default()
        }
        .normalized();

        assert_eq!(query.limit, MAX_LIST_LIMIT);
        assert!(query.search.is_none());
    }

    #[test]
    fn search_matches_any_column_case_insensitively() {
        let query = RecordListQuery {
            search: Some("EDIT".to_owned()),
            ..RecordListQuery::default()
        };

        assert!(query.matches_search("1", "posts.edit", "web"));
        assert!(!query.matches_search("1", "posts.view", "web"));
    }
}
