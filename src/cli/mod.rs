pub mod orchestration;

pub use orchestration::{build_release, build_release_with, run_sort, BuildOutcome, BuildRequest};
