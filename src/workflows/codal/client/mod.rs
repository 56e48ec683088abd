//! HTTP-backed gateways for the Codal portal.

mod detail;
mod render;
mod search;
mod transport;

pub use detail::DetailPageEnricher;
pub use render::PopplerRenderer;
pub use search::CodalSearchClient;
pub use transport::{HttpSettings, HttpTransport, TransportError};
