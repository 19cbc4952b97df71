pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod justify;
pub mod middleware;
pub mod rate_limiter;
pub mod registry;
pub mod response;
pub mod server;
pub mod token;
pub mod validation;

pub use config::Config;
pub use error::{ApiError, Result};
pub use server::{build_router, Server};
