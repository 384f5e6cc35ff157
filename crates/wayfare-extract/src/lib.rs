//! Wayfare Extract — the extraction pipeline: heuristic recognition,
//! AI-structured extraction, and the booking indexer that merges the two
//! and persists the results.

pub mod candidates;
pub mod completion;
pub mod document;
pub mod heuristic;
pub mod indexer;

pub use candidates::{BookingCandidates, FlightCandidate, HotelCandidate};
pub use completion::{
    CompletionClient, EmptyReason, ExtractOutcome, StructuredExtractor, TEXT_BUDGET,
};
pub use document::IncomingDocument;
pub use indexer::{BookingIndexer, IndexReport};
