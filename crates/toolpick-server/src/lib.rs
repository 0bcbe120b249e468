pub mod protocol;
pub mod server;

pub use server::{GameServer, ServerConfig, SessionMode};
