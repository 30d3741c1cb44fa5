use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod create_identity;
pub mod foreign_map;
pub mod get;
pub mod get_identity;
pub mod list;
pub mod put;
pub mod put_field;
pub mod share;

// Re-export for convenience
pub use create_identity::CreateIdentityRequest;
pub use foreign_map::{AddMappingRequest, ForeignMapRequest, RemoveMappingRequest};
pub use get::GetRequest;
pub use get_identity::GetIdentityRequest;
pub use list::ListRequest;
pub use put::PutRequest;
pub use put_field::PutFieldRequest;
pub use share::{ShareRequest, UnshareRequest};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler))
        .route("/:origin", get(get::handler).post(put::handler))
        .route(
            "/:origin/identities/:uid",
            get(get_identity::handler).post(create_identity::handler),
        )
        .route("/:origin/identities/:uid/:field_name", post(put_field::handler))
        .route(
            "/:origin/identities/:uid/:field_name/share",
            post(share::share_handler),
        )
        .route(
            "/:origin/identities/:uid/:field_name/unshare",
            post(share::unshare_handler),
        )
        .route(
            "/:origin/foreign_map",
            get(foreign_map::get_handler)
                .post(foreign_map::add_handler)
                .delete(foreign_map::remove_handler),
        )
        .with_state(state)
}
