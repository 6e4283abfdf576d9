// src/services/role_policy.rs

//! The admin-role invariant as a pure function over the current role holders.

use crate::models::User;
use uuid::Uuid;

/// The only account allowed to keep superuser rights.
pub const CANONICAL_ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChangeKind {
  /// Grant superuser and staff.
  Promote,
  /// Drop superuser, keep staff.
  Demote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
  pub user_id: Uuid,
  pub username: String,
  pub kind: RoleChangeKind,
}

impl RoleChange {
  /// `(is_staff, is_superuser)` after the change.
  pub fn target_flags(&self) -> (bool, bool) {
    match self.kind {
      RoleChangeKind::Promote => (true, true),
      RoleChangeKind::Demote => (true, false),
    }
  }
}

/// Changes that bring `holders` in line with the invariant.
///
/// The canonical admin is promoted if it lacks either flag; every other
/// superuser is demoted to staff. Users that are neither are ignored, so the
/// plan for an already converged set is empty.
pub fn plan_role_changes(holders: &[User]) -> Vec<RoleChange> {
  let mut promotions = Vec::new();
  let mut demotions = Vec::new();
  for user in holders {
    let kind = if user.username == CANONICAL_ADMIN_USERNAME {
      if user.is_superuser && user.is_staff {
        continue;
      }
      RoleChangeKind::Promote
    } else if user.is_superuser {
      RoleChangeKind::Demote
    } else {
      continue;
    };
    let change = RoleChange {
      user_id: user.id,
      username: user.username.clone(),
      kind,
    };
    match kind {
      RoleChangeKind::Promote => promotions.push(change),
      RoleChangeKind::Demote => demotions.push(change),
    }
  }
  demotions.sort_by(|a, b| a.username.cmp(&b.username));
  promotions.extend(demotions);
  promotions
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn user(username: &str, is_staff: bool, is_superuser: bool) -> User {
    User {
      id: Uuid::new_v4(),
      username: username.to_string(),
      email: format!("{}@example.com", username),
      first_name: String::new(),
      last_name: String::new(),
      password_hash: String::new(),
      is_active: true,
      is_staff,
      is_superuser,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  fn apply(users: &mut [User], plan: &[RoleChange]) {
    for change in plan {
      if let Some(u) = users.iter_mut().find(|u| u.id == change.user_id) {
        (u.is_staff, u.is_superuser) = change.target_flags();
      }
    }
  }

  #[test]
  fn promotes_admin_and_demotes_everyone_else() {
    let users = vec![user("admin", false, false), user("zoe", false, true), user("bob", true, true)];
    let plan = plan_role_changes(&users);
    let summary: Vec<(&str, RoleChangeKind)> = plan.iter().map(|c| (c.username.as_str(), c.kind)).collect();
    assert_eq!(
      summary,
      vec![
        ("admin", RoleChangeKind::Promote),
        ("bob", RoleChangeKind::Demote),
        ("zoe", RoleChangeKind::Demote),
      ]
    );
  }

  #[test]
  fn converged_set_needs_no_changes() {
    let mut users = vec![user("admin", false, true), user("eve", true, true), user("carl", true, false)];
    let plan = plan_role_changes(&users);
    apply(&mut users, &plan);
    assert!(plan_role_changes(&users).is_empty());
    assert!(users.iter().filter(|u| u.is_superuser).all(|u| u.username == "admin"));
    assert!(users.iter().all(|u| u.is_staff));
  }

  #[test]
  fn missing_admin_only_demotes() {
    let users = vec![user("root", true, true)];
    let plan = plan_role_changes(&users);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].target_flags(), (true, false));
  }
}
