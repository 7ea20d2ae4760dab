pub mod artifacts;
pub mod model;
pub mod signals;

pub use artifacts::{ArtifactStore, TickerArtifacts};
pub use model::{ModelFormat, ModelRegistry, SequenceModel};
pub use signals::SignalService;
