//! Gateway callback handlers.

mod process_gateway_event;

pub use process_gateway_event::{ProcessGatewayEventCommand, ProcessGatewayEventHandler};
