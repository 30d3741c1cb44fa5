use axum::Router;

mod response;
pub mod services;

pub use response::{Envelope, RequestError};

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/services", services::router(state.clone()))
        .with_state(state)
}
