//! The acting viewer of a search request.

use serde::{Deserialize, Serialize};

/// Identity of whoever is performing a search.
///
/// Authentication happens upstream; the core only consumes the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// None for anonymous visitors
    pub user_id: Option<u64>,
    /// Staff can see restricted, hidden and deleted content
    #[serde(default)]
    pub staff: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            staff: false,
        }
    }

    pub fn staff(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            staff: true,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    /// True when the viewer is the given user.
    pub fn is_user(&self, user_id: u64) -> bool {
        self.user_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_constructors() {
        assert!(Viewer::anonymous().is_anonymous());
        assert!(!Viewer::anonymous().staff);
        assert!(Viewer::user(3).is_user(3));
        assert!(!Viewer::user(3).is_user(4));
        assert!(Viewer::staff(1).staff);
    }
}
