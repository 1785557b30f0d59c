//! Entity normalisation.
//! - `species`: upstream item → canonical `SpeciesRecord`
//! - `groups`: taxonomic group label → iconic taxon name

pub mod groups;
pub mod species;

pub use groups::{canonical_group, iconic_taxon};
pub use species::{has_display_name, normalise_item, normalise_items};
