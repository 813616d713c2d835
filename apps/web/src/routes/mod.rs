//! Route table.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod items;
pub mod oauth;
pub mod pages;
pub mod suppliers;

use axum::Router;
use serde::Deserialize;
use stockroom_core::Page;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(oauth::routes())
        .merge(items::routes())
        .merge(categories::routes())
        .merge(suppliers::routes())
        .merge(dashboard::routes())
        .merge(pages::routes())
}

/// `?skip=&limit=&search=` shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}
