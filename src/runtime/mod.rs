pub mod collaborators;
pub mod normalize;
pub mod session;

pub use collaborators::{PhotoUploader, ReferenceDataProvider, RemoteSubmitter};
pub use session::WizardSession;
