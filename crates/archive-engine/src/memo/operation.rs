//! Named families of memoized results.

use std::fmt;

/// A memoized operation. Entries of one operation are flushed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoOperation {
    /// Resource closure by resource id.
    Ancestors,
    /// File-record closure by file id.
    FileAncestors,
    /// Effective access right by resource id.
    AccessRight,
    /// Effective access right by file id.
    FileAccessRight,
    /// Category lookup by slug.
    Category,
    /// Access-right option lookup by id.
    OptionTerm,
}

impl MemoOperation {
    /// Operations whose results depend on the hierarchy or on explicit rights.
    pub const ANCESTRY: [Self; 4] = [
        Self::Ancestors,
        Self::FileAncestors,
        Self::AccessRight,
        Self::FileAccessRight,
    ];

    /// Operations answered by the type registry and option resolver.
    pub const REGISTRY: [Self; 2] = [Self::Category, Self::OptionTerm];

    /// Effective access-right lookups only.
    pub const ACCESS: [Self; 2] = [Self::AccessRight, Self::FileAccessRight];

    /// Every operation, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Ancestors,
        Self::FileAncestors,
        Self::AccessRight,
        Self::FileAccessRight,
        Self::Category,
        Self::OptionTerm,
    ];

    /// Position of this operation in [`Self::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Key segment for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ancestors => "ancestors",
            Self::FileAncestors => "file_ancestors",
            Self::AccessRight => "access_right",
            Self::FileAccessRight => "file_access_right",
            Self::Category => "category",
            Self::OptionTerm => "option_term",
        }
    }
}

impl fmt::Display for MemoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_segment_is_prefix_of_another() {
        for a in &MemoOperation::ALL {
            for b in &MemoOperation::ALL {
                if a != b {
                    let pattern = format!("{a}:");
                    assert!(!format!("{b}:x").starts_with(&pattern), "{a} shadows {b}");
                }
            }
        }
    }

    #[test]
    fn test_index_matches_position() {
        for (position, operation) in MemoOperation::ALL.iter().enumerate() {
            assert_eq!(operation.index(), position);
        }
    }
}
