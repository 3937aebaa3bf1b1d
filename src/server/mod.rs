mod error;
mod routes;
pub(crate) mod session;
pub(crate) mod state;
mod upload;

pub use error::ApiError;
pub use routes::{make_app, run_server};
pub use session::{AdminSession, Session};
pub use state::ServerState;
