//! Role gates for Bridgeway operations
//!
//! Seniors ask and review; youth browse and answer. Every mutating endpoint
//! names its operation here and checks the caller's role before touching the
//! store. Unknown operations are blocked.

use crate::db::schemas::Role;

/// Who may perform an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any authenticated profile
    Any,
    /// Senior profiles only
    SeniorOnly,
    /// Youth profiles only
    YouthOnly,
}

/// Get the required access for an operation.
/// Returns None for unknown operations (which should be blocked).
pub fn required_access(operation: &str) -> Option<Access> {
    match operation {
        // Either role
        "get_question" | "list_answers" | "view_profile" | "view_points" | "view_activities" => {
            Some(Access::Any)
        }

        // Senior side: asking and reviewing
        "create_question" | "list_own_questions" | "accept_answer" | "reject_answer" => {
            Some(Access::SeniorOnly)
        }

        // Youth side: browsing, answering, spending points
        "list_pending_questions" | "submit_answer" | "redeem_points" => Some(Access::YouthOnly),

        // Unknown operations are blocked
        _ => None,
    }
}

/// Check if an operation is allowed for the given role
pub fn is_operation_allowed(operation: &str, role: Role) -> bool {
    match required_access(operation) {
        Some(Access::Any) => true,
        Some(Access::SeniorOnly) => role == Role::Senior,
        Some(Access::YouthOnly) => role == Role::Youth,
        None => false, // Unknown operations are blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_senior_operations() {
        assert!(is_operation_allowed("create_question", Role::Senior));
        assert!(is_operation_allowed("accept_answer", Role::Senior));
        assert!(!is_operation_allowed("create_question", Role::Youth));
        assert!(!is_operation_allowed("accept_answer", Role::Youth));
    }

    #[test]
    fn test_youth_operations() {
        assert!(is_operation_allowed("submit_answer", Role::Youth));
        assert!(is_operation_allowed("redeem_points", Role::Youth));
        assert!(!is_operation_allowed("submit_answer", Role::Senior));
        assert!(!is_operation_allowed("redeem_points", Role::Senior));
    }

    #[test]
    fn test_shared_operations() {
        assert!(is_operation_allowed("view_points", Role::Senior));
        assert!(is_operation_allowed("view_points", Role::Youth));
        assert!(is_operation_allowed("get_question", Role::Youth));
    }

    #[test]
    fn test_unknown_operations_blocked() {
        assert!(!is_operation_allowed("drop_all_tables", Role::Senior));
        assert!(!is_operation_allowed("unknown_operation", Role::Youth));
    }
}
