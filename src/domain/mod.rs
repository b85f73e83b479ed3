// Domain layer: plain records and the ports the collaborators implement.

pub mod model;
pub mod ports;
