//! BulkSelectionController - row selection and bulk actions for an admin
//! table.
//!
//! The selection is always a subset of the rows on screen. Destructive
//! actions wait for an explicit confirmation; every completed action, good
//! or bad, clears the selection.

use std::sync::Arc;
use uuid::Uuid;

use crate::application::{BulkReport, OrderedCollectionStore};
use crate::domain::collection::{CollectionError, PayloadPatch};
use crate::domain::foundation::{EntityId, PublicationStatus, ValidationError};
use crate::domain::selection::{Selection, SelectionState, ViewQuery, VisibleView};
use crate::ports::{Notification, Notifier};

/// Action applied to every selected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    SetStatus(PublicationStatus),
}

impl BulkAction {
    /// Destructive actions need a confirmation step.
    pub fn is_destructive(&self) -> bool {
        matches!(self, BulkAction::Delete)
    }

    fn verb(&self) -> &'static str {
        match self {
            BulkAction::Delete => "deleted",
            BulkAction::SetStatus(PublicationStatus::Published) => "published",
            BulkAction::SetStatus(PublicationStatus::Draft) => "moved to draft",
            BulkAction::SetStatus(PublicationStatus::Archived) => "archived",
        }
    }
}

/// Handle for a destructive action awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmationToken(Uuid);

#[derive(Debug, Clone)]
struct PendingAction {
    token: ConfirmationToken,
    action: BulkAction,
    ids: Vec<EntityId>,
}

/// Answer to [`BulkSelectionController::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkRequest {
    /// Ask the user to confirm `count` rows; pass `token` to `confirm`.
    PendingConfirmation {
        token: ConfirmationToken,
        action: BulkAction,
        count: usize,
    },
    /// The action ran straight away.
    Completed(BulkReport),
}

pub struct BulkSelectionController {
    store: OrderedCollectionStore,
    notifier: Arc<dyn Notifier>,
    max_per_page: u32,
    query: ViewQuery,
    view: VisibleView,
    selection: Selection,
    pending: Option<PendingAction>,
}

impl BulkSelectionController {
    /// Creates a controller showing the first page of `store`.
    pub fn new(store: OrderedCollectionStore, notifier: Arc<dyn Notifier>, max_per_page: u32) -> Self {
        let query = ViewQuery {
            per_page: ViewQuery::default().per_page.min(max_per_page.max(1)),
            ..ViewQuery::default()
        };
        let mut controller = Self {
            store,
            notifier,
            max_per_page,
            query,
            view: VisibleView::default(),
            selection: Selection::new(),
            pending: None,
        };
        controller.refresh();
        controller
    }

    pub fn store(&self) -> &OrderedCollectionStore {
        &self.store
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Rows the current query shows over the Store as it is now.
    pub fn view(&self) -> VisibleView {
        self.query.apply(&self.store.entities())
    }

    pub fn state(&self) -> SelectionState {
        self.current_selection().state()
    }

    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.current_selection().ids()
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.current_selection().contains(id)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Switches filter/sort/page. Selected rows that leave the view are
    /// deselected; any pending confirmation is dropped.
    ///
    /// # Errors
    ///
    /// - `Validation` if the page or page size is out of range
    pub fn set_view(&mut self, query: ViewQuery) -> Result<&VisibleView, CollectionError> {
        query.validate(self.max_per_page)?;
        self.query = query;
        if self.pending.take().is_some() {
            tracing::debug!("View changed, pending bulk action dropped");
        }
        self.refresh();
        Ok(&self.view)
    }

    /// Recomputes the visible rows from the Store's current entities.
    pub fn refresh(&mut self) -> &VisibleView {
        self.view = self.query.apply(&self.store.entities());
        let evicted = self.selection.set_visible(self.view.ids.clone());
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), "Selection narrowed to visible rows");
        }
        &self.view
    }

    /// Returns false if `id` is not on screen.
    pub fn toggle(&mut self, id: &EntityId) -> bool {
        self.refresh();
        self.selection.toggle(id)
    }

    pub fn toggle_all(&mut self) {
        self.refresh();
        self.selection.toggle_all();
    }

    /// Starts `action` on the current selection.
    ///
    /// # Errors
    ///
    /// - `Validation` if nothing is selected, or the collection has no status
    ///   and a status change was requested
    pub async fn request(&mut self, action: BulkAction) -> Result<BulkRequest, CollectionError> {
        self.refresh();
        let ids = self.selection.ids();
        if ids.is_empty() {
            return Err(ValidationError::empty_field("selection").into());
        }
        if let BulkAction::SetStatus(_) = action {
            if !self.store.scope().collection.has_status() {
                return Err(ValidationError::invalid_format(
                    "status",
                    format!("{} entries have no publication status", self.store.scope().collection),
                )
                .into());
            }
        }

        if action.is_destructive() {
            let token = ConfirmationToken(Uuid::new_v4());
            let count = ids.len();
            self.pending = Some(PendingAction { token, action, ids });
            return Ok(BulkRequest::PendingConfirmation {
                token,
                action,
                count,
            });
        }

        self.execute(action, ids).await.map(BulkRequest::Completed)
    }

    /// Runs the pending action matching `token`.
    ///
    /// Rows that left the Store since the request are skipped.
    ///
    /// # Errors
    ///
    /// - `Validation` if no action with this token is pending, or none of
    ///   its rows are still shown
    pub async fn confirm(&mut self, token: ConfirmationToken) -> Result<BulkReport, CollectionError> {
        let mut pending = match self.pending.take() {
            Some(p) if p.token == token => p,
            other => {
                self.pending = other;
                return Err(ValidationError::invalid_format(
                    "token",
                    "no bulk action awaiting this confirmation",
                )
                .into());
            }
        };
        self.refresh();
        pending.ids.retain(|id| self.view.contains(id));
        if pending.ids.is_empty() {
            self.selection.clear();
            return Err(ValidationError::empty_field("selection").into());
        }
        self.execute(pending.action, pending.ids).await
    }

    /// Drops the pending action. Returns false if there was none.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// The selection narrowed to rows the Store still shows, without
    /// waiting for the next `refresh`.
    fn current_selection(&self) -> Selection {
        let mut selection = self.selection.clone();
        selection.set_visible(self.view().ids);
        selection
    }

    async fn execute(
        &mut self,
        action: BulkAction,
        ids: Vec<EntityId>,
    ) -> Result<BulkReport, CollectionError> {
        tracing::debug!(?action, count = ids.len(), "Running bulk action");
        let result = match action {
            BulkAction::Delete => self.store.remove_many(&ids).await,
            BulkAction::SetStatus(status) => {
                self.store
                    .update_many(&ids, &PayloadPatch::status_only(status))
                    .await
            }
        };

        self.selection.clear();
        self.refresh();

        match result {
            Ok(report) => {
                self.notifier.notify(summarize(action, &report));
                Ok(report)
            }
            Err(err) => {
                self.notifier
                    .notify(Notification::error(err.message()).with_entities(ids));
                Err(err)
            }
        }
    }
}

fn summarize(action: BulkAction, report: &BulkReport) -> Notification {
    let verb = action.verb();
    if report.is_complete_success() {
        return Notification::success(format!("{} entries {}", report.succeeded_count(), verb));
    }
    let message = format!(
        "{} entries {}, {} failed",
        report.succeeded_count(),
        verb,
        report.failed_count()
    );
    let notification = if report.succeeded.is_empty() {
        Notification::error(message)
    } else {
        Notification::warning(message)
    };
    notification.with_entities(report.failed_ids())
}
