pub mod poller;
pub mod provider;
pub mod transport;

pub use poller::{PollState, SeenAt, SeenKey};
pub use provider::{BlockId, PollerConfig, Provider};
pub use transport::{HttpTransport, JsonRpcSender};
