//! Checkpoint chain lifecycle: create, populate, finalize, persist.
//!
//! A checkpoint moves through three states that are encoded in the type:
//!
//! - [`Pending`]: shell created with every aggregate at its default, not yet
//!   stored. Aggregators fill it in through [`Pending::checkpoint_mut`].
//! - [`Populated`]: the per-member loop is done.
//! - [`Finalized`]: running totals coerced, averages computed, predecessor
//!   linked. Only this state can be persisted.

use crate::db::{StoreError, UnitOfWork};
use crate::domain::ChainCheckpoint;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("checkpoint {previous} is already linked to {existing}, refusing to link {next}")]
    AlreadyLinked {
        previous: String,
        existing: String,
        next: String,
    },
    #[error("checkpoint {checkpoint} expects predecessor {expected:?}, got {actual:?}")]
    PredecessorMismatch {
        checkpoint: String,
        expected: Option<String>,
        actual: Option<String>,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct Pending<C>(C);

#[derive(Debug)]
pub struct Populated<C>(C);

#[derive(Debug)]
pub struct Finalized<C> {
    checkpoint: C,
    previous: Option<C>,
}

pub struct CheckpointChainManager;

impl CheckpointChainManager {
    /// Whether a checkpoint with this id has already been stored (or staged).
    pub async fn is_indexed<C: ChainCheckpoint>(
        uow: &UnitOfWork<'_>,
        id: &str,
    ) -> Result<bool, StoreError> {
        uow.exists::<C>(id).await
    }

    /// Start a new checkpoint from `shell`.
    ///
    /// Returns `None` if a checkpoint with the same id already exists, which
    /// makes re-processing the triggering event a no-op.
    pub async fn create<C: ChainCheckpoint>(
        uow: &UnitOfWork<'_>,
        shell: C,
    ) -> Result<Option<Pending<C>>, StoreError> {
        if Self::is_indexed::<C>(uow, shell.id()).await? {
            debug!(checkpoint = shell.id(), kind = C::KIND, "checkpoint already indexed");
            return Ok(None);
        }
        Ok(Some(Pending(shell)))
    }

    /// Load the predecessor named by the checkpoint's back reference.
    pub async fn load_previous<C: ChainCheckpoint>(
        uow: &UnitOfWork<'_>,
        checkpoint: &C,
    ) -> Result<Option<C>, StoreError> {
        match checkpoint.previous_ref() {
            Some(id) => uow.load::<C>(id).await,
            None => Ok(None),
        }
    }

    /// Point `previous` forward at `next`.
    ///
    /// Linking is idempotent for the same successor and refuses to overwrite a
    /// different one.
    pub fn link<C: ChainCheckpoint>(previous: &mut C, next: &C) -> Result<(), ChainError> {
        match previous.next_ref() {
            Some(existing) if existing != next.id() => Err(ChainError::AlreadyLinked {
                previous: previous.id().to_string(),
                existing: existing.to_string(),
                next: next.id().to_string(),
            }),
            _ => {
                previous.set_next_ref(next.id().to_string());
                Ok(())
            }
        }
    }

    /// Stage the finalized checkpoint and its re-linked predecessor.
    pub fn persist<C: ChainCheckpoint>(
        uow: &mut UnitOfWork<'_>,
        finalized: &Finalized<C>,
    ) -> Result<(), StoreError> {
        if let Some(previous) = &finalized.previous {
            uow.save(previous)?;
        }
        uow.save(&finalized.checkpoint)
    }
}

impl<C: ChainCheckpoint> Pending<C> {
    pub fn checkpoint(&self) -> &C {
        &self.0
    }

    pub fn checkpoint_mut(&mut self) -> &mut C {
        &mut self.0
    }

    /// Mark the member loop as complete.
    pub fn populated(self) -> Populated<C> {
        Populated(self.0)
    }
}

impl<C: ChainCheckpoint> Populated<C> {
    pub fn checkpoint(&self) -> &C {
        &self.0
    }

    /// Coerce zero running totals from `previous`, compute averages and link
    /// `previous` forward to this checkpoint.
    ///
    /// `previous` must be the checkpoint named by the back reference.
    pub fn finalize(self, previous: Option<C>) -> Result<Finalized<C>, ChainError> {
        let mut checkpoint = self.0;

        let expected = checkpoint.previous_ref().map(str::to_string);
        let actual = previous.as_ref().map(|p| p.id().to_string());
        if expected != actual {
            return Err(ChainError::PredecessorMismatch {
                checkpoint: checkpoint.id().to_string(),
                expected,
                actual,
            });
        }

        let previous = match previous {
            Some(mut previous) => {
                checkpoint.coerce_zero_running_totals(&previous);
                CheckpointChainManager::link(&mut previous, &checkpoint)?;
                Some(previous)
            }
            None => None,
        };
        checkpoint.compute_averages();

        Ok(Finalized {
            checkpoint,
            previous,
        })
    }
}

impl<C: ChainCheckpoint> Finalized<C> {
    pub fn checkpoint(&self) -> &C {
        &self.checkpoint
    }

    pub fn previous(&self) -> Option<&C> {
        self.previous.as_ref()
    }
}
