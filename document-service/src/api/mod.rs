pub mod extract;
pub mod handler;
pub mod openapi;
pub mod reply;
pub mod router;
pub mod state;
