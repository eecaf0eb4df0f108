pub mod fetcher;
pub mod interface;

pub use fetcher::{ensure_artifact, FetchOutcome, HttpArtifactSource};
pub use interface::ArtifactSource;
