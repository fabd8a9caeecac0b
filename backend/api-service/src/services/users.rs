use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::UserSummary;
use std::sync::Arc;

pub const MAX_SEARCH_RESULTS: i64 = 20;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Substring search over usernames and emails, capped at
    /// `MAX_SEARCH_RESULTS`
    pub async fn search_users(&self, query: Option<&str>) -> Result<Vec<UserSummary>> {
        let term = query.map(str::trim).unwrap_or_default();
        if term.is_empty() {
            return Err(AppError::ValidationError(
                "Search query is required".to_string(),
            ));
        }

        Ok(self.users.search_users(term, MAX_SEARCH_RESULTS).await?)
    }
}
