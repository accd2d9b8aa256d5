use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::filter::{Column, Filter, Order};
use crate::models::{Caller, Lead, LeadPatch, NewLead, TargetType};
use crate::repo::{expect_single, LeadTable, TableError};

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<Lead>,
    last_created: Option<DateTime<Utc>>,
    fail_next: Option<TableError>,
}

/// In-memory LeadTable for tests and offline use.
///
/// Row-level security is simulated: unless disabled with
/// [`without_row_security`](Self::without_row_security), a caller only ever
/// sees and touches its own rows, whatever filter it sends.
#[derive(Clone, Debug)]
pub struct MemoryTable {
    inner: Arc<Mutex<Inner>>,
    requests: Arc<AtomicUsize>,
    row_security: bool,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            inner: Arc::default(),
            requests: Arc::default(),
            row_security: true,
        }
    }
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_row_security(mut self) -> Self {
        self.row_security = false;
        self
    }

    /// Number of requests served so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Make the next request fail with `error`.
    pub fn fail_next(&self, error: TableError) {
        self.lock().fail_next = Some(error);
    }

    /// Snapshot of every stored row, ignoring ownership.
    pub fn rows(&self) -> Vec<Lead> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the request and take any injected failure.
    fn begin(&self) -> Result<MutexGuard<'_, Inner>, TableError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        match inner.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(inner),
        }
    }

    fn visible(&self, caller: &Caller, filter: &Filter, lead: &Lead) -> bool {
        (!self.row_security || lead.user_id == caller.user_id) && filter.matches(lead)
    }
}

fn sort(rows: &mut [Lead], order: Order) {
    rows.sort_by(|a, b| {
        let ord = match order.column {
            Column::CreatedAt => a.created_at.cmp(&b.created_at),
            column => column.value_of(a).cmp(&column.value_of(b)),
        };
        if order.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

impl LeadTable for MemoryTable {
    async fn select(
        &self,
        caller: &Caller,
        filter: &Filter,
        order: Order,
    ) -> Result<Vec<Lead>, TableError> {
        let inner = self.begin()?;
        let mut rows: Vec<Lead> = inner
            .rows
            .iter()
            .filter(|lead| self.visible(caller, filter, lead))
            .cloned()
            .collect();
        sort(&mut rows, order);
        Ok(rows)
    }

    async fn select_single(&self, caller: &Caller, filter: &Filter) -> Result<Lead, TableError> {
        let inner = self.begin()?;
        let rows = inner
            .rows
            .iter()
            .filter(|lead| self.visible(caller, filter, lead))
            .cloned()
            .collect();
        expect_single(rows)
    }

    async fn insert(&self, caller: &Caller, rows: &[NewLead]) -> Result<Vec<Lead>, TableError> {
        let mut inner = self.begin()?;
        if self.row_security && rows.iter().any(|r| r.user_id != caller.user_id) {
            return Err(TableError::Rejected {
                status: 403,
                message: "new row violates row-level security policy".to_string(),
            });
        }

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            // Strictly increasing timestamps keep newest-first ordering stable.
            let now = Utc::now();
            let created_at = match inner.last_created {
                Some(last) if now <= last => last + Duration::microseconds(1),
                _ => now,
            };
            inner.last_created = Some(created_at);

            let fields = row.fields.clone();
            let lead = Lead {
                id: Uuid::new_v4(),
                created_at,
                name: fields.name,
                email: fields.email,
                phone: fields.phone,
                address: fields.address,
                is_active: fields.is_active,
                status: fields.status,
                last_followup_remarks: fields.last_followup_remarks,
                next_steps: fields.next_steps,
                priority: fields.priority,
                target_type: fields.target_type.unwrap_or(TargetType::NonTarget),
                user_id: row.user_id,
            };
            inner.rows.push(lead.clone());
            inserted.push(lead);
        }
        Ok(inserted)
    }

    async fn update(
        &self,
        caller: &Caller,
        filter: &Filter,
        patch: &LeadPatch,
    ) -> Result<Vec<Lead>, TableError> {
        let mut inner = self.begin()?;
        let mut updated = Vec::new();
        for lead in inner.rows.iter_mut() {
            if self.visible(caller, filter, lead) {
                patch.apply(lead);
                updated.push(lead.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, caller: &Caller, filter: &Filter) -> Result<Vec<Lead>, TableError> {
        let mut inner = self.begin()?;
        let (deleted, kept): (Vec<Lead>, Vec<Lead>) = inner
            .rows
            .drain(..)
            .partition(|lead| self.visible(caller, filter, lead));
        inner.rows = kept;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadFields, LeadStatus};

    fn caller() -> Caller {
        Caller {
            user_id: Uuid::new_v4(),
            access_token: "token".to_string(),
        }
    }

    fn named(name: &str) -> LeadFields {
        LeadFields {
            name: name.to_string(),
            ..LeadFields::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_select_newest_first() {
        let table = MemoryTable::new();
        let me = caller();

        table
            .insert(&me, &[named("first").owned_by(me.user_id)])
            .await
            .unwrap();
        table
            .insert(&me, &[named("second").owned_by(me.user_id)])
            .await
            .unwrap();

        let rows = table
            .select(&me, &Filter::owned_by(me.user_id), Order::newest_first())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "second");
        assert_eq!(rows[1].name, "first");
        assert!(rows[0].created_at > rows[1].created_at);
        assert_eq!(table.request_count(), 3);
    }

    #[tokio::test]
    async fn test_row_security_hides_other_owners() {
        let table = MemoryTable::new();
        let alice = caller();
        let bob = caller();

        let rows = table
            .insert(&alice, &[named("alice's").owned_by(alice.user_id)])
            .await
            .unwrap();
        let id = rows[0].id;

        // Even with no owner filter, bob cannot see or touch alice's row.
        let seen = table
            .select(&bob, &Filter::new(), Order::newest_first())
            .await
            .unwrap();
        assert!(seen.is_empty());
        assert_eq!(
            table.select_single(&bob, &Filter::new().with_id(id)).await,
            Err(TableError::NoRows)
        );
        let updated = table
            .update(
                &bob,
                &Filter::new().with_id(id),
                &LeadPatch::new().status(LeadStatus::Close),
            )
            .await
            .unwrap();
        assert!(updated.is_empty());
        assert!(table
            .delete(&bob, &Filter::new().with_id(id))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(table.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_for_another_owner_is_rejected() {
        let table = MemoryTable::new();
        let me = caller();
        let result = table
            .insert(&me, &[named("x").owned_by(Uuid::new_v4())])
            .await;
        assert!(matches!(result, Err(TableError::Rejected { status: 403, .. })));
        assert!(table.rows().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_return_affected_rows() {
        let table = MemoryTable::new();
        let me = caller();
        let rows = table
            .insert(
                &me,
                &[named("a").owned_by(me.user_id), named("b").owned_by(me.user_id)],
            )
            .await
            .unwrap();

        let filter = Filter::owned_by(me.user_id).with_id(rows[0].id);
        let updated = table
            .update(&me, &filter, &LeadPatch::new().status(LeadStatus::Pending))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, LeadStatus::Pending);

        let deleted = table.delete(&me, &filter).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].name, "b");
    }

    #[tokio::test]
    async fn test_select_single_multiple_rows() {
        let table = MemoryTable::new();
        let me = caller();
        table
            .insert(
                &me,
                &[named("a").owned_by(me.user_id), named("b").owned_by(me.user_id)],
            )
            .await
            .unwrap();
        assert_eq!(
            table
                .select_single(&me, &Filter::owned_by(me.user_id))
                .await,
            Err(TableError::MultipleRows(2))
        );
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let table = MemoryTable::new();
        let me = caller();
        table.fail_next(TableError::Transport("connection reset".to_string()));

        let first = table
            .select(&me, &Filter::new(), Order::newest_first())
            .await;
        assert_eq!(
            first,
            Err(TableError::Transport("connection reset".to_string()))
        );
        assert!(table
            .select(&me, &Filter::new(), Order::newest_first())
            .await
            .is_ok());
        assert_eq!(table.request_count(), 2);
    }
}
