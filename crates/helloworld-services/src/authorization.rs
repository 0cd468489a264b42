use async_trait::async_trait;
use std::collections::HashSet;

use helloworld_core::constants::{COMPONENT, CREATE_ACTION};
use helloworld_core::models::Principal;
use helloworld_core::AuthorizationService;

/// Fixed access rules: registered users may create greetings, guests only when allowed.
/// Individual user ids can be blocked.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorization {
    allow_guests: bool,
    blocked_users: HashSet<i64>,
}

impl StaticAuthorization {
    pub fn new(allow_guests: bool) -> Self {
        Self {
            allow_guests,
            blocked_users: HashSet::new(),
        }
    }

    pub fn block_user(mut self, id: i64) -> Self {
        self.blocked_users.insert(id);
        self
    }
}

#[async_trait]
impl AuthorizationService for StaticAuthorization {
    async fn authorize(&self, principal: &Principal, action: &str, asset: &str) -> bool {
        if action != CREATE_ACTION || asset != COMPONENT {
            tracing::debug!(action = %action, asset = %asset, "Unknown action or asset");
            return false;
        }

        if principal.is_anonymous() {
            return self.allow_guests;
        }

        !self.blocked_users.contains(&principal.id)
    }
}
