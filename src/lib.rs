//! File candidates for Cleo assistant responses.
//!
//! The model can embed "make this a file" blocks in its answer; [`ftms`]
//! cuts those out of the chat text, falls back to heuristics when there are
//! none, and stores the documents a user keeps.

pub mod config;
pub mod ftms;
pub mod tools;
pub mod util;

pub use config::Config;
pub use ftms::{
    process_response, CandidateOrigin, FileCandidate, FileType, ProcessOptions, ProcessedResponse,
    ResponseProcessor,
};
