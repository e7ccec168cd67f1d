// Domain layer: models, locator vocabulary and ports (interfaces). Adapters implement the ports.

pub mod locator;
pub mod model;
pub mod ports;
