//! Concrete network adapters for the engine's ports.

mod http;
mod ws;

pub use http::HttpStatusClient;
pub use ws::WebSocketPushClient;
