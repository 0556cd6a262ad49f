//! OrbitWatch HTTP surface: router, shared state, background refresh.

pub mod error;
pub mod routes;
pub mod state;
pub mod worker;

pub use routes::build_router;
pub use state::AppState;
