// Adapters layer: concrete implementations for external systems.
// `http` talks to the upstream APIs; `server` and `lambda` host the ingress.

pub mod http;

#[cfg(feature = "lambda")]
pub mod lambda;
#[cfg(feature = "server")]
pub mod server;
