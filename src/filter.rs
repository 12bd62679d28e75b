//! Check selection for --group, --check, --scored and --unscored
//!
//! Supports:
//! - Group allow-list: --group 1.1,1.2
//! - Check allow-list: --check 1.1.1,1.2.3
//! - Scoring selection: --scored / --unscored (used when neither list is given)

use crate::controls::{Check, Group};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while compiling selection options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("group option and check option can't be used together")]
    MutuallyExclusive,
}

/// Selection options as supplied by the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOpts {
    /// Select checks that contribute to the score
    pub scored: bool,

    /// Select checks that do not contribute to the score
    pub unscored: bool,

    /// Group identifiers to run (empty = no group restriction)
    pub group_list: HashSet<String>,

    /// Check identifiers to run (empty = no check restriction)
    pub check_list: HashSet<String>,
}

impl Default for FilterOpts {
    fn default() -> Self {
        Self {
            scored: true,
            unscored: true,
            group_list: HashSet::new(),
            check_list: HashSet::new(),
        }
    }
}

impl FilterOpts {
    /// Parse a comma-separated allow-list like "1.1, 1.2,,1.3"
    pub fn parse_list(spec: &str) -> HashSet<String> {
        spec.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Selection {
    Groups(HashSet<String>),
    Checks(HashSet<String>),
    Scoring { scored: bool, unscored: bool },
}

/// Compiled run filter that decides which (group, check) pairs execute
#[derive(Debug, Clone)]
pub struct RunFilter {
    selection: Selection,
}

impl RunFilter {
    /// Compile selection options into a filter
    ///
    /// # Errors
    /// Returns [`FilterError::MutuallyExclusive`] when both the group and the
    /// check allow-list are non-empty.
    pub fn compile(opts: &FilterOpts) -> Result<Self, FilterError> {
        let selection = match (opts.group_list.is_empty(), opts.check_list.is_empty()) {
            (false, false) => return Err(FilterError::MutuallyExclusive),
            (false, true) => Selection::Groups(opts.group_list.clone()),
            (true, false) => Selection::Checks(opts.check_list.clone()),
            (true, true) => Selection::Scoring {
                scored: opts.scored,
                unscored: opts.unscored,
            },
        };

        Ok(Self { selection })
    }

    /// Check if a check in the given group should run
    pub fn matches(&self, group: &Group, check: &Check) -> bool {
        match &self.selection {
            Selection::Groups(ids) => ids.contains(&group.id),
            Selection::Checks(ids) => ids.contains(&check.id),
            Selection::Scoring { scored, unscored } => {
                (*scored && check.scored) || (*unscored && !check.scored)
            }
        }
    }
}
