//! Thin JSON-over-HTTP layer.
//!
//! Handlers parse bodies into plain records, call the services, and let
//! [`Error`](crate::error::Error) pick the status code.

pub mod cats;
pub mod error;
pub mod extract;
pub mod missions;

use std::sync::Arc;

use axum::Router;
use axum::routing::{MethodRouter, get, post};

use crate::breeds::BreedRegistry;
use crate::engine::MissionEngine;
use crate::engine::cats::CatService;
use crate::store::Store;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub missions: Arc<MissionEngine>,
    pub cats: Arc<CatService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, breeds: Arc<dyn BreedRegistry>) -> Self {
        Self {
            missions: Arc::new(MissionEngine::new(Arc::clone(&store))),
            cats: Arc::new(CatService::new(store, breeds)),
        }
    }
}

/// Register `handler` at `path` and at `path` with a trailing slash.
fn route_both(
    router: Router<AppState>,
    path: &str,
    handler: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

pub fn router(state: AppState) -> Router {
    let routes: [(&str, MethodRouter<AppState>); 6] = [
        ("/cats", get(cats::list).post(cats::create)),
        (
            "/cats/{id}",
            get(cats::get).patch(cats::update).delete(cats::delete),
        ),
        ("/missions", get(missions::list).post(missions::create)),
        (
            "/missions/{id}",
            get(missions::get)
                .patch(missions::update)
                .delete(missions::delete),
        ),
        ("/missions/{id}/assign", post(missions::assign_cat)),
        (
            "/missions/{mission_id}/targets/{target_id}/notes",
            post(missions::update_notes),
        ),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| {
            route_both(router, path, handler)
        })
        .with_state(state)
}
