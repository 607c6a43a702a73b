#![forbid(unsafe_code)]

use crate::identity::Session;
use crate::prefs::Preferences;
use jd_core::BranchTag;
use time::UtcOffset;

pub const BRANCH_CENTRO: &str = "centro";
pub const BRANCH_EJEMPLARES: &str = "ejemplares";

/// Session-wide mutable state. Passed explicitly to the subscription manager,
/// the lifecycle controller and the bulk operator.
#[derive(Clone, Debug)]
pub struct AppState {
    pub session: Option<Session>,
    /// Display name stamped as `createdBy` on new tasks. May be empty.
    pub username: String,
    pub branch: BranchTag,
    /// Autocomplete source, loaded once per session.
    pub stock_list: Vec<String>,
    pub utc_offset: UtcOffset,
}

impl AppState {
    pub fn new(branch: BranchTag, utc_offset: UtcOffset) -> Self {
        Self {
            session: None,
            username: String::new(),
            branch,
            stock_list: Vec::new(),
            utc_offset,
        }
    }

    pub fn from_preferences(prefs: &Preferences, utc_offset: UtcOffset) -> Self {
        let mut state = Self::new(prefs.branch_tag(), utc_offset);
        state.username = prefs.username().trim().to_string();
        state
    }

    pub fn preferences(&self) -> Preferences {
        let username = self.username.trim();
        Preferences {
            username: (!username.is_empty()).then(|| username.to_string()),
            branch: Some(self.branch.as_str().to_string()),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Returns true when the active branch actually changed.
    pub fn set_branch(&mut self, branch: BranchTag) -> bool {
        if self.branch == branch {
            return false;
        }
        self.branch = branch;
        true
    }

    /// Flips between the two shop branches. Any other branch goes to centro.
    pub fn toggle_branch(&mut self) -> &BranchTag {
        let next = if self.branch.as_str() == BRANCH_CENTRO {
            BRANCH_EJEMPLARES
        } else {
            BRANCH_CENTRO
        };
        if let Ok(tag) = BranchTag::try_new(next) {
            self.branch = tag;
        }
        &self.branch
    }

    pub fn set_username(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.username = name.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_shop_branches() {
        let mut state = AppState::new(BranchTag::default(), UtcOffset::UTC);
        assert_eq!(state.toggle_branch().as_str(), BRANCH_EJEMPLARES);
        assert_eq!(state.toggle_branch().as_str(), BRANCH_CENTRO);

        state.set_branch(BranchTag::try_new("vivero").expect("branch"));
        assert_eq!(state.toggle_branch().as_str(), BRANCH_CENTRO);
    }

    #[test]
    fn set_branch_reports_changes_only() {
        let mut state = AppState::new(BranchTag::default(), UtcOffset::UTC);
        assert!(!state.set_branch(BranchTag::default()));
        assert!(state.set_branch(BranchTag::try_new(BRANCH_EJEMPLARES).expect("branch")));
    }

    #[test]
    fn preferences_round_trip_through_state() {
        let prefs = Preferences {
            username: Some("  Ana ".to_string()),
            branch: Some(BRANCH_EJEMPLARES.to_string()),
        };
        let mut state = AppState::from_preferences(&prefs, UtcOffset::UTC);
        assert_eq!(state.username, "Ana");
        assert_eq!(state.branch.as_str(), BRANCH_EJEMPLARES);

        assert!(!state.set_username("   "));
        assert_eq!(state.preferences().username.as_deref(), Some("Ana"));
    }
}
