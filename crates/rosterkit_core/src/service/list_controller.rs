//! List controller: prompt-driven commands over the reconciliation cycle.
//!
//! # Responsibility
//! - Translate add/rename/remove commands into store mutations, commits,
//!   and observation cycles.
//! - Enforce the prompt policy: trimmed-empty or cancelled input is a
//!   complete no-op (no record, no commit, no emission).
//!
//! # Invariants
//! - Every committed mutation is followed by exactly one observation cycle
//!   on the same owner context.
//! - Rename passes the renamed identity as the content-change hint so an
//!   order-preserving rename still repaints its row.

use crate::model::record::{RecordAttributes, RecordId};
use crate::observe::ChangeObserver;
use crate::service::prompt::{PromptOutcome, PromptRequest, TextPrompt};
use crate::store::{RecordQuery, RecordStore, StoreError};
use crate::view::{ListSurface, ReconcileError, RowRenderer, ViewReconciler};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Command-level error for controller operations.
#[derive(Debug)]
pub enum ControlError {
    Store(StoreError),
    Reconcile(ReconcileError),
}

impl Display for ControlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Reconcile(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Reconcile(err) => Some(err),
        }
    }
}

impl From<StoreError> for ControlError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ReconcileError> for ControlError {
    fn from(value: ReconcileError) -> Self {
        Self::Reconcile(value)
    }
}

/// Owns the store, the prompt, and the observer whose listener is the
/// view reconciler. One instance per observed list, on one owner context.
pub struct ListController<S, P, V, R> {
    store: S,
    prompt: P,
    observer: ChangeObserver<ViewReconciler<V, R>>,
}

impl<S, P, V, R> ListController<S, P, V, R>
where
    S: RecordStore,
    P: TextPrompt,
    V: ListSurface,
    R: RowRenderer<Row = V::Row>,
{
    pub fn new(store: S, prompt: P, surface: V, renderer: R) -> Self {
        Self {
            store,
            prompt,
            observer: ChangeObserver::new(
                RecordQuery::default(),
                ViewReconciler::new(surface, renderer),
            ),
        }
    }

    /// Populates the view from current committed state. The first
    /// population is applied without animation by the reconciler.
    pub fn start(&mut self) -> Result<(), ControlError> {
        self.observer.initial_fetch(&self.store)?;
        Ok(())
    }

    /// Prompts for a name and creates a record from it.
    ///
    /// Returns `None` when the prompt was cancelled or the trimmed input
    /// was empty; nothing is staged or committed in that case.
    pub fn add_item(&mut self) -> Result<Option<RecordId>, ControlError> {
        let request = PromptRequest::new("New Item", "Name");
        let Some(name) = confirmed_name(self.prompt.prompt(&request)) else {
            info!("event=add_item module=service status=ok outcome=noop");
            return Ok(None);
        };

        let id = self.store.create(RecordAttributes::named(name))?;
        self.store.commit()?;
        self.observer.store_committed(&self.store, &[])?;
        info!("event=add_item module=service status=ok outcome=created id={id}");
        Ok(Some(id))
    }

    /// Prompts for a new name for an existing record and renames it.
    ///
    /// Returns `false` on cancelled/empty input or when the name did not
    /// change. `NotFound` surfaces when the identity is absent.
    pub fn rename_item(&mut self, id: RecordId) -> Result<bool, ControlError> {
        let current = self.store.get(id)?.ok_or(StoreError::NotFound(id))?;

        let request = PromptRequest::new("Rename Item", "Name").with_initial(current.name.clone());
        let Some(name) = confirmed_name(self.prompt.prompt(&request)) else {
            info!("event=rename_item module=service status=ok outcome=noop id={id}");
            return Ok(false);
        };
        if name == current.name {
            info!("event=rename_item module=service status=ok outcome=unchanged id={id}");
            return Ok(false);
        }

        self.store.update(id, RecordAttributes::named(name))?;
        self.store.commit()?;
        self.observer.store_committed(&self.store, &[id])?;
        info!("event=rename_item module=service status=ok outcome=renamed id={id}");
        Ok(true)
    }

    /// Deletes a record and reconciles the view.
    pub fn remove_item(&mut self, id: RecordId) -> Result<(), ControlError> {
        self.store.delete(id)?;
        self.store.commit()?;
        self.observer.store_committed(&self.store, &[])?;
        info!("event=remove_item module=service status=ok id={id}");
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    /// Order last rendered by the view.
    pub fn applied_snapshot(&self) -> &crate::diff::Snapshot {
        self.observer.listener().applied()
    }

    pub fn surface(&self) -> &V {
        self.observer.listener().surface()
    }

    pub fn surface_mut(&mut self) -> &mut V {
        self.observer.listener_mut().surface_mut()
    }
}

/// Applies the prompt policy: confirmed, trimmed, non-empty input only.
fn confirmed_name(outcome: PromptOutcome) -> Option<String> {
    match outcome {
        PromptOutcome::Confirmed(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        PromptOutcome::Cancelled => None,
    }
}
