//! Tagging services.
//!
//! Extraction turns document content into model input, placement writes
//! tags back, and [`TaggingService`] runs the two around a suggestion
//! provider.

pub mod extraction;
pub mod placement;
mod tagging;

pub use extraction::{ExtractedContent, extract_block, extract_page, extract_selection};
pub use placement::{Placement, PlacementMode};
pub use tagging::{PROGRESS_NOTICE_DURATION, TaggingResult, TaggingService, user_message};
