// Domain layer: request/result models, upstream ports and the field extraction rules.
// No HTTP client or server types live here.

pub mod extract;
pub mod model;
pub mod ports;
