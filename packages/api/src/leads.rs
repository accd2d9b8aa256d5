//! # Record Synchronizer
//!
//! [`LeadSync`] keeps a [`LeadMirror`] of the signed-in user's leads in step
//! with the remote [`LeadTable`]. Every operation:
//!
//! 1. sets `loading` and clears `error`,
//! 2. takes the caller from its [`CallerSource`] (refreshing an expired
//!    access token when the source is the session authority), failing with
//!    [`Error::NotAuthenticated`] before any remote call when there is none,
//! 3. scopes the remote call by the caller's id (and the lead id, where one is
//!    given),
//! 4. patches the mirror from the rows the server returned,
//! 5. clears `loading`, and on failure records the message in `error` before
//!    returning it.
//!
//! The mirror is tagged with the user it was filled for. It is reset whenever
//! an operation runs for a different user, or when [`LeadSync::follow_session`]
//! sees the session change hands, so it never shows another user's rows.
//!
//! Concurrent mutations are not serialized: their mirror patches land in the
//! order their responses arrive (last writer wins).

use std::sync::Arc;

use store::repo::expect_single;
use store::{
    coerce_rows, Caller, Filter, ImportRow, ImportWarning, Lead, LeadFields, LeadId, LeadMirror,
    LeadPatch, LeadStats, LeadTable, Order, TableError, UserId,
};
use tokio::sync::watch;

use crate::authority::{AuthState, CallerSource};
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadsState {
    pub mirror: LeadMirror,
    pub loading: bool,
    pub error: Option<String>,
}

/// Outcome of [`LeadSync::import_rows`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    /// Rows created by the server, newest first.
    pub leads: Vec<Lead>,
    /// Values that were present but not recognized.
    pub warnings: Vec<ImportWarning>,
}

#[derive(Clone)]
pub struct LeadSync<T, S = watch::Receiver<AuthState>> {
    table: T,
    auth: S,
    state: Arc<watch::Sender<LeadsState>>,
}

impl<T: LeadTable, S: CallerSource> LeadSync<T, S> {
    pub fn new(table: T, auth: S) -> Self {
        Self {
            table,
            auth,
            state: Arc::new(watch::channel(LeadsState::default()).0),
        }
    }

    pub fn state(&self) -> LeadsState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<LeadsState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> LeadStats {
        self.state.borrow().mirror.stats()
    }

    /// Reset the mirror whenever the signed-in user changes. Runs until the
    /// session authority is dropped.
    pub async fn follow_session(&self) {
        let mut auth = self.auth.session_changes();
        loop {
            let owner = auth.borrow_and_update().user_id();
            self.adopt(owner);
            if auth.changed().await.is_err() {
                break;
            }
        }
    }

    /// Fetch every lead owned by the caller, newest first.
    pub async fn fetch_all(&self) -> Result<()> {
        self.tracked("fetch_all", |caller| async move {
            let rows = self
                .table
                .select(&caller, &Filter::owned_by(caller.user_id), Order::newest_first())
                .await?;
            let count = rows.len();
            let mut dropped = 0;
            self.state
                .send_modify(|s| dropped = s.mirror.replace_all(caller.user_id, rows));
            if dropped > 0 {
                tracing::warn!(dropped, "discarded rows owned by another user");
            }
            tracing::debug!(op = "fetch_all", count = count - dropped, "leads fetched");
            Ok(())
        })
        .await
    }

    /// Fetch one lead into the current slot. `Ok(None)` when the lead does not
    /// exist or is not the caller's.
    pub async fn fetch_one(&self, id: LeadId) -> Result<Option<Lead>> {
        self.tracked("fetch_one", |caller| async move {
            self.state.send_modify(|s| s.mirror.set_current(None));
            let filter = Filter::owned_by(caller.user_id).with_id(id);
            match self.table.select_single(&caller, &filter).await {
                Ok(lead) => {
                    self.state
                        .send_modify(|s| s.mirror.set_current(Some(lead.clone())));
                    Ok(Some(lead))
                }
                Err(TableError::NoRows) => {
                    tracing::debug!(op = "fetch_one", lead_id = %id, "lead not found");
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    pub async fn create(&self, fields: LeadFields) -> Result<Lead> {
        self.tracked("create", |caller| async move {
            let rows = self
                .table
                .insert(&caller, &[fields.owned_by(caller.user_id)])
                .await?;
            let lead = expect_single(rows)?;
            let mut accepted = false;
            self.state
                .send_modify(|s| accepted = s.mirror.prepend(lead.clone()));
            if !accepted {
                tracing::warn!(
                    lead_id = %lead.id,
                    "session changed during create, mirror left untouched"
                );
            }
            tracing::debug!(op = "create", lead_id = %lead.id, "lead created");
            Ok(lead)
        })
        .await
    }

    pub async fn update(&self, id: LeadId, patch: LeadPatch) -> Result<Lead> {
        self.tracked("update", |caller| async move {
            let filter = Filter::owned_by(caller.user_id).with_id(id);
            let rows = self.table.update(&caller, &filter, &patch).await?;
            let lead = expect_single(rows)?;
            self.state.send_modify(|s| {
                s.mirror.patch(lead.clone());
            });
            tracing::debug!(op = "update", lead_id = %id, "lead updated");
            Ok(lead)
        })
        .await
    }

    pub async fn delete(&self, id: LeadId) -> Result<()> {
        self.tracked("delete", |caller| async move {
            let filter = Filter::owned_by(caller.user_id).with_id(id);
            let rows = self.table.delete(&caller, &filter).await?;
            if rows.is_empty() {
                return Err(Error::NotFoundOrForbidden);
            }
            self.state.send_modify(|s| {
                s.mirror.remove(id);
            });
            tracing::debug!(op = "delete", lead_id = %id, "lead deleted");
            Ok(())
        })
        .await
    }

    /// Apply `patch` to every selected lead. Clears the selection on success.
    pub async fn bulk_update(&self, patch: LeadPatch) -> Result<Vec<Lead>> {
        self.tracked("bulk_update", |caller| async move {
            let ids = self.state.borrow().mirror.selected().to_vec();
            if ids.is_empty() {
                return Err(Error::Validation("No leads selected".to_string()));
            }
            let filter = Filter::owned_by(caller.user_id).with_ids(&ids);
            let rows = self.table.update(&caller, &filter, &patch).await?;
            self.state.send_modify(|s| {
                for lead in &rows {
                    s.mirror.patch(lead.clone());
                }
                s.mirror.clear_selection();
            });
            tracing::debug!(op = "bulk_update", count = rows.len(), "leads updated");
            Ok(rows)
        })
        .await
    }

    /// Coerce loosely-typed rows and insert them as one batch. The created rows
    /// are prepended to the mirror; nothing is re-fetched.
    pub async fn import_rows(&self, rows: &[ImportRow]) -> Result<ImportReport> {
        self.tracked("import", |caller| async move {
            if rows.is_empty() {
                return Err(Error::Validation("No rows to import".to_string()));
            }
            let coerced = coerce_rows(rows);
            for warning in &coerced.warnings {
                tracing::warn!(op = "import", "{warning}");
            }
            let batch: Vec<_> = coerced
                .rows
                .into_iter()
                .map(|fields| fields.owned_by(caller.user_id))
                .collect();
            let mut created = self.table.insert(&caller, &batch).await?;
            created.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let mut accepted = 0;
            self.state
                .send_modify(|s| accepted = s.mirror.prepend_many(created.clone()));
            tracing::debug!(op = "import", count = accepted, "leads imported");
            Ok(ImportReport {
                leads: created,
                warnings: coerced.warnings,
            })
        })
        .await
    }

    pub fn select(&self, id: LeadId) -> bool {
        self.state.send_if_modified(|s| s.mirror.select(id))
    }

    pub fn deselect(&self, id: LeadId) -> bool {
        self.state.send_if_modified(|s| s.mirror.deselect(id))
    }

    pub fn toggle_selected(&self, id: LeadId) {
        self.state.send_modify(|s| s.mirror.toggle(id));
    }

    pub fn select_all(&self) {
        self.state.send_modify(|s| s.mirror.select_all());
    }

    pub fn clear_selection(&self) {
        self.state.send_modify(|s| s.mirror.clear_selection());
    }

    /// Run `op` under the loading/error envelope.
    async fn tracked<R, F, Fut>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(Caller) -> Fut,
        Fut: std::future::Future<Output = Result<R>>,
    {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        let result = match self.auth.current_caller().await {
            Some(caller) => {
                self.adopt(Some(caller.user_id));
                f(caller).await
            }
            None => Err(Error::NotAuthenticated),
        };
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = result.as_ref().err().map(Error::to_string);
        });
        if let Err(e) = &result {
            tracing::error!(op, "lead operation failed: {e}");
        }
        result
    }

    /// Re-tag the mirror for `owner`, dropping its contents if it changed.
    fn adopt(&self, owner: Option<UserId>) {
        self.state.send_if_modified(|s| {
            if s.mirror.owner() == owner {
                return false;
            }
            s.mirror.reset(owner);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, Credential};
    use crate::authority::SessionAuthority;
    use crate::fake::{session_for, FakeAdmin, FakeAuth};
    use serde_json::json;
    use store::{LeadStatus, MemoryTable, Priority};
    use uuid::Uuid;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: None,
            phone: None,
        }
    }

    fn signed_in(user: &AuthUser) -> watch::Sender<AuthState> {
        watch::channel(AuthState {
            session: Some(session_for(user)),
            restored: true,
            ..AuthState::default()
        })
        .0
    }

    fn named(name: &str) -> LeadFields {
        LeadFields {
            name: name.to_string(),
            ..LeadFields::default()
        }
    }

    fn names(sync: &LeadSync<MemoryTable>) -> Vec<String> {
        sync.state()
            .mirror
            .leads()
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_requires_session_before_remote_call() {
        let table = MemoryTable::new();
        let auth = watch::channel(AuthState::default()).0;
        let sync = LeadSync::new(table.clone(), auth.subscribe());

        assert_eq!(sync.fetch_all().await, Err(Error::NotAuthenticated));
        assert_eq!(sync.create(named("x")).await, Err(Error::NotAuthenticated));
        assert_eq!(table.request_count(), 0);
        let state = sync.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("User not authenticated"));
    }

    #[tokio::test]
    async fn test_create_prepends_server_row() {
        let me = user();
        let auth = signed_in(&me);
        let sync = LeadSync::new(MemoryTable::new(), auth.subscribe());
        sync.create(named("first")).await.unwrap();

        let before = sync.state().mirror.len();
        let lead = sync.create(named("second")).await.unwrap();
        let state = sync.state();
        assert_eq!(state.mirror.len(), before + 1);
        assert_eq!(state.mirror.leads()[0], lead);
        assert_eq!(lead.user_id, me.id);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_fetch_all_newest_first_and_owner_scoped() {
        let table = MemoryTable::new();
        let alice = user();
        let bob = user();
        let alice_auth = signed_in(&alice);
        let bob_auth = signed_in(&bob);
        let alice_sync = LeadSync::new(table.clone(), alice_auth.subscribe());
        let bob_sync = LeadSync::new(table.clone(), bob_auth.subscribe());

        alice_sync.create(named("a1")).await.unwrap();
        bob_sync.create(named("b1")).await.unwrap();
        alice_sync.create(named("a2")).await.unwrap();

        let fresh = LeadSync::new(table, alice_auth.subscribe());
        fresh.fetch_all().await.unwrap();
        assert_eq!(names(&fresh), vec!["a2", "a1"]);
        assert!(fresh
            .state()
            .mirror
            .leads()
            .iter()
            .all(|l| l.user_id == alice.id));
    }

    #[tokio::test]
    async fn test_foreign_rows_from_store_are_dropped() {
        let table = MemoryTable::new().without_row_security();
        let alice = user();
        let bob = user();
        let alice_auth = signed_in(&alice);
        let bob_auth = signed_in(&bob);
        LeadSync::new(table.clone(), bob_auth.subscribe())
            .create(named("bob's"))
            .await
            .unwrap();

        let sync = LeadSync::new(table, alice_auth.subscribe());
        sync.fetch_all().await.unwrap();
        assert!(sync.state().mirror.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_and_missing_ids_look_the_same() {
        let table = MemoryTable::new();
        let alice = user();
        let bob = user();
        let alice_auth = signed_in(&alice);
        let bob_auth = signed_in(&bob);
        let alice_sync = LeadSync::new(table.clone(), alice_auth.subscribe());
        let bob_sync = LeadSync::new(table.clone(), bob_auth.subscribe());
        let theirs = alice_sync.create(named("alice's")).await.unwrap();

        for id in [theirs.id, Uuid::new_v4()] {
            assert_eq!(bob_sync.fetch_one(id).await, Ok(None));
            assert_eq!(bob_sync.state().error, None);
            assert_eq!(
                bob_sync
                    .update(id, LeadPatch::new().status(LeadStatus::Close))
                    .await,
                Err(Error::NotFoundOrForbidden)
            );
            assert_eq!(bob_sync.delete(id).await, Err(Error::NotFoundOrForbidden));
            assert_eq!(bob_sync.state().error.as_deref(), Some("Lead not found"));
        }
        assert_eq!(table.rows(), vec![theirs]);
    }

    #[tokio::test]
    async fn test_fetch_one_sets_current() {
        let me = user();
        let auth = signed_in(&me);
        let sync = LeadSync::new(MemoryTable::new(), auth.subscribe());
        let lead = sync.create(named("x")).await.unwrap();

        assert_eq!(sync.fetch_one(lead.id).await, Ok(Some(lead.clone())));
        assert_eq!(sync.state().mirror.current(), Some(&lead));
        assert_eq!(sync.fetch_one(Uuid::new_v4()).await, Ok(None));
        assert_eq!(sync.state().mirror.current(), None);
    }

    #[tokio::test]
    async fn test_delete_clears_current() {
        let me = user();
        let auth = signed_in(&me);
        let sync = LeadSync::new(MemoryTable::new(), auth.subscribe());
        let lead = sync.create(named("x")).await.unwrap();
        sync.fetch_one(lead.id).await.unwrap();

        sync.delete(lead.id).await.unwrap();
        let state = sync.state();
        assert!(state.mirror.get(lead.id).is_none());
        assert!(state.mirror.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_mirror_untouched() {
        let me = user();
        let auth = signed_in(&me);
        let table = MemoryTable::new();
        let sync = LeadSync::new(table.clone(), auth.subscribe());
        let lead = sync.create(named("x")).await.unwrap();
        let before = sync.state().mirror;

        table.fail_next(TableError::Transport("connection reset".to_string()));
        let err = sync
            .update(lead.id, LeadPatch::new().priority(Priority::High))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Transport("connection reset".to_string()));
        let state = sync.state();
        assert_eq!(state.mirror, before);
        assert_eq!(state.error.as_deref(), Some("connection reset"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_bulk_update_empty_selection_makes_no_call() {
        let me = user();
        let auth = signed_in(&me);
        let table = MemoryTable::new();
        let sync = LeadSync::new(table.clone(), auth.subscribe());
        sync.create(named("x")).await.unwrap();
        let requests = table.request_count();

        let err = sync
            .bulk_update(LeadPatch::new().status(LeadStatus::Pending))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(table.request_count(), requests);
    }

    #[tokio::test]
    async fn test_bulk_update_patches_selection_and_clears_it() {
        let me = user();
        let auth = signed_in(&me);
        let sync = LeadSync::new(MemoryTable::new(), auth.subscribe());
        let a = sync.create(named("a")).await.unwrap();
        let b = sync.create(named("b")).await.unwrap();
        let c = sync.create(named("c")).await.unwrap();
        assert!(sync.select(a.id));
        sync.toggle_selected(c.id);

        let updated = sync
            .bulk_update(LeadPatch::new().status(LeadStatus::Pending))
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        let state = sync.state();
        assert!(state.mirror.selected().is_empty());
        assert_eq!(state.mirror.get(a.id).unwrap().status, LeadStatus::Pending);
        assert_eq!(state.mirror.get(b.id).unwrap().status, LeadStatus::Open);
        assert_eq!(state.mirror.get(c.id).unwrap().status, LeadStatus::Pending);
        assert_eq!(sync.stats().pending, 2);
    }

    #[tokio::test]
    async fn test_import_prepends_coerced_rows() {
        let me = user();
        let auth = signed_in(&me);
        let table = MemoryTable::new();
        let sync = LeadSync::new(table.clone(), auth.subscribe());
        sync.create(named("existing")).await.unwrap();

        let rows: Vec<ImportRow> = [
            json!({"name": "one", "status": "Bogus", "priority": "high"}),
            json!({"name": "two", "is_active": "FALSE"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let requests = table.request_count();
        let report = sync.import_rows(&rows).await.unwrap();

        assert_eq!(table.request_count(), requests + 1);
        assert_eq!(report.leads.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(names(&sync), vec!["two", "one", "existing"]);
        let state = sync.state();
        let one = &state.mirror.leads()[1];
        assert_eq!(one.status, LeadStatus::Open);
        assert_eq!(one.priority, Priority::High);
        assert!(one.is_active);
        assert!(!sync.state().mirror.leads()[0].is_active);
    }

    #[tokio::test]
    async fn test_follow_session_resets_mirror_for_new_user() {
        let alice = user();
        let bob = user();
        let auth = signed_in(&alice);
        let sync = LeadSync::new(MemoryTable::new(), auth.subscribe());
        sync.create(named("alice's")).await.unwrap();

        let follower = sync.clone();
        let task = tokio::spawn(async move { follower.follow_session().await });
        auth.send_modify(|s| s.session = Some(session_for(&bob)));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let state = sync.state();
        assert!(state.mirror.is_empty());
        assert_eq!(state.mirror.owner(), Some(bob.id));
        task.abort();
    }

    #[tokio::test]
    async fn test_operations_under_new_user_never_show_old_rows() {
        let table = MemoryTable::new();
        let alice = user();
        let bob = user();
        let auth = signed_in(&alice);
        let sync = LeadSync::new(table, auth.subscribe());
        sync.create(named("alice's")).await.unwrap();

        auth.send_modify(|s| s.session = Some(session_for(&bob)));
        let lead = sync.create(named("bob's")).await.unwrap();
        assert_eq!(sync.state().mirror.leads(), &[lead]);
    }

    #[tokio::test]
    async fn test_end_to_end_session() {
        let auth = FakeAuth::new();
        auth.add_account(Credential::Email("rep@example.com".to_string()), "pw");
        let authority = SessionAuthority::new(auth, FakeAdmin::new());
        let sync = LeadSync::new(MemoryTable::new(), authority.watch());
        authority
            .login(Credential::Email("rep@example.com".to_string()), "pw")
            .await
            .unwrap();

        let r1 = sync.create(named("R1")).await.unwrap();
        let r2 = sync.create(named("R2")).await.unwrap();
        assert_eq!(names(&sync), vec!["R2", "R1"]);

        sync.update(r1.id, LeadPatch::new().status(LeadStatus::Close))
            .await
            .unwrap();
        assert_eq!(names(&sync), vec!["R2", "R1"]);
        assert_eq!(
            sync.state().mirror.get(r1.id).unwrap().status,
            LeadStatus::Close
        );

        sync.delete(r2.id).await.unwrap();
        assert_eq!(names(&sync), vec!["R1"]);

        authority.logout().await.unwrap();
        assert_eq!(sync.fetch_all().await, Err(Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_before_remote_call() {
        let auth = FakeAuth::new();
        let rep = auth.add_account(Credential::Email("rep@example.com".to_string()), "pw");
        let mut stale = session_for(&rep);
        stale.access_token = "stale".to_string();
        stale.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);
        auth.set_session(Some(stale));
        let authority = SessionAuthority::new(auth.clone(), FakeAdmin::new());
        authority.initialize().await;

        auth.set_session(Some(session_for(&rep)));
        let sync = LeadSync::new(MemoryTable::new(), authority.clone());
        let lead = sync.create(named("after an hour")).await.unwrap();
        assert_eq!(lead.user_id, rep.id);
        assert_eq!(
            authority.state().caller().unwrap().access_token,
            session_for(&rep).access_token
        );
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_is_not_authenticated() {
        let auth = FakeAuth::new();
        let rep = auth.add_account(Credential::Email("rep@example.com".to_string()), "pw");
        let mut stale = session_for(&rep);
        stale.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);
        auth.set_session(Some(stale));
        let authority = SessionAuthority::new(auth.clone(), FakeAdmin::new());
        authority.initialize().await;

        auth.set_session(None);
        let table = MemoryTable::new();
        let sync = LeadSync::new(table.clone(), authority.clone());
        assert_eq!(sync.fetch_all().await, Err(Error::NotAuthenticated));
        assert_eq!(table.request_count(), 0);
        assert!(!authority.state().is_authenticated());
    }
}
