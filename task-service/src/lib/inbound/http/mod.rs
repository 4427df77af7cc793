pub mod gatekeeper;
pub mod handlers;
pub mod middleware;
pub mod router;
