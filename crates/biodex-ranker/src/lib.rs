//! biodex-ranker — Confidence ranking of normalised species records.

pub mod scorer;
pub mod weights;

pub use scorer::{is_server_scored, rank};
pub use weights::DecayProfile;
