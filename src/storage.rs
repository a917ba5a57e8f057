//! Read-only access to architecture models.
//!
//! The validation and analysis passes never touch the filesystem. They work
//! on a [`ModelSnapshot`] obtained from a [`ModelSource`], which for on-disk
//! models is a [`Directory`].

mod directory;
mod snapshot;

pub use directory::{Directory, LoadError};
pub use snapshot::{ModelMetadata, ModelSnapshot};

/// Anything that can produce a complete model snapshot.
pub trait ModelSource {
    /// Produces a snapshot of the whole model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be read in full. Partial
    /// snapshots are never returned.
    fn snapshot(&self) -> Result<ModelSnapshot, LoadError>;
}

impl ModelSource for ModelSnapshot {
    fn snapshot(&self) -> Result<ModelSnapshot, LoadError> {
        Ok(self.clone())
    }
}
