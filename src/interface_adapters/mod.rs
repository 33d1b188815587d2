// Interface adapters: wire protocol, remote sensor and network handling.

pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod sensors;
pub mod state;
pub mod utils;
