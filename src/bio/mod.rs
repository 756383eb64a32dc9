pub mod citation;
pub mod coords;
pub mod markers;
pub mod record;
pub mod region;
pub mod xml;

pub use markers::{Marker, MarkerFlags};
pub use record::{parse_batch, RawSequenceRecord, SeqSchema};
pub use region::{MatchReason, RegionMatcher};
