use uuid::Uuid;

/// Authenticated principal plus a per-request correlation id. Passed
/// explicitly into every guard, search and service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContext {
    pub operator_id: String,
    pub request_id: String,
}

impl OperatorContext {
    pub fn new(operator_id: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            request_id: Uuid::now_v7().to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_request_id(operator_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            request_id: request_id.into(),
        }
    }

    pub fn is(&self, principal_id: &str) -> bool {
        self.operator_id == principal_id
    }
}

#[cfg(test)]
mod tests {
    use super::OperatorContext;

    #[test]
    fn new_contexts_get_distinct_request_ids() {
        let first = OperatorContext::new("u-1");
        let second = OperatorContext::new("u-1");
        assert_eq!(first.operator_id, "u-1");
        assert_ne!(first.request_id, second.request_id);
    }

    #[test]
    fn compares_principal_ids_exactly() {
        let ctx = OperatorContext::with_request_id("u-1", "req-1");
        assert!(ctx.is("u-1"));
        assert!(!ctx.is("U-1"));
        assert!(!ctx.is("u-1 "));
    }
}
