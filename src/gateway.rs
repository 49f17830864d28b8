pub mod events;
pub mod logs;
pub mod memory;
pub mod factory;

// Logs is the shipping default; Memory records events so tests can assert
// on notification decisions.
#[derive(Debug, PartialEq)]
pub enum GatewayPublisherVia {
    Logs,
    Memory,
}
