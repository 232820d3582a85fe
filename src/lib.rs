pub mod config;
pub mod extract;
pub mod gemini;
pub mod knowledge;
pub mod matcher;
pub mod models;
pub mod paginate;
pub mod sequence;
pub mod server;
pub mod thought;

pub use config::AppConfig;
pub use server::run_server;
