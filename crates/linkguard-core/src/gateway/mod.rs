//! Chat platform port and decorators.

pub mod port;
pub mod timeout;

pub use port::ChatGateway;
pub use timeout::TimeoutGateway;
