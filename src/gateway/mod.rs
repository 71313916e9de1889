//! Gateway dispatch: configuration, transport seam, url/proxy resolution,
//! the retrying `Dispatcher` and the `AmfResult` it hands back.

pub mod config;
pub mod dispatcher;
pub mod result;
pub mod routing;
pub mod server;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use result::AmfResult;
pub use server::Server;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};
