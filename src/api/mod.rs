pub mod form;
pub mod handlers;
pub mod projection;
pub mod response;
mod routes;

pub use routes::create_router;
