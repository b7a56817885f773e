//! Enforcement exemption for privileged operators.

use serde::{Deserialize, Serialize};

use super::gate::Caller;

/// Decides whether a caller bypasses maintenance enforcement entirely.
///
/// The predicate is recomputed on every check and must never be cached on
/// a session: a role can be revoked between two requests. An undecidable
/// identity (unauthenticated, or the surrounding layer could not resolve
/// a role and passed an empty one) is simply non-exempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionPolicy {
    /// Role required before the identity predicate is consulted at all.
    pub privileged_role: String,
    /// Account ids that are always exempt (given the privileged role).
    pub allow_list: Vec<String>,
    /// Trailing digit marking built-in operator accounts.
    pub id_suffix: char,
}

impl Default for ExemptionPolicy {
    fn default() -> Self {
        Self {
            privileged_role: "admin".to_string(),
            allow_list: Vec::new(),
            id_suffix: '0',
        }
    }
}

impl ExemptionPolicy {
    pub fn is_exempt(&self, caller: &Caller) -> bool {
        caller.authenticated
            && caller.role == self.privileged_role
            && (caller.id.ends_with(self.id_suffix)
                || self.allow_list.iter().any(|id| id == &caller.id))
    }
}
