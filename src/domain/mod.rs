// Domain layer: credential models and the ports links and stores implement.

pub mod model;
pub mod ports;
