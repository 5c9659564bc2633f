//! File placement: output naming, overwrite confirmation, routed writes and
//! pre-made design lookup.

pub mod filename;
pub mod placer;
pub mod premade;
pub mod prompt;

pub use filename::generate_filename;
pub use placer::{FilePlacer, PlacementReport};
pub use premade::{find_premade_designs, PremadeCandidate, PremadeLookup};
pub use prompt::{AlwaysOverwrite, NeverOverwrite, OverwritePrompt};
