mod persistence;
mod session;
mod store;

pub use persistence::{ArtifactLoader, ArtifactWriter, ARTIFACTS_FILE, SOURCE_FILE};
pub use session::{Session, SessionState};
pub use store::{ArtifactFailure, ArtifactSet, ArtifactSlot, ArtifactStore};
