pub mod http;
pub mod registry;
pub mod transport;

pub use http::HttpPeerTransport;
pub use registry::{connect_peer, Liveness, Peer, PeerRegistry};
pub use transport::{PeerError, PeerInfo, PeerTransport, PromptContent, PromptMessage, ToolSpec};
