pub mod entrez;

pub use entrez::{Endpoint, EntrezClient, EutilsTransport};
