pub mod dispatch;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod sanitize;

pub use routes::create_router;
