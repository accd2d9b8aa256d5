//! # Local mirror of the caller's leads
//!
//! [`LeadMirror`] is the in-memory copy the UI renders from. It holds:
//!
//! - `leads`: the caller's rows in server order (newest first),
//! - `current`: the single lead focused by a detail or edit view,
//! - `selected`: ids marked for a bulk operation,
//! - `owner`: the user the mirror was filled for.
//!
//! The mirror never fetches anything itself. The synchronizer in the `api`
//! crate replaces it wholesale after a full fetch and patches it surgically
//! after each successful mutation. Rows that do not belong to `owner` are
//! refused by every insert path, and the selection only ever holds ids that
//! are present in `leads`.

use crate::models::{Lead, LeadId, LeadStats, UserId};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadMirror {
    owner: Option<UserId>,
    leads: Vec<Lead>,
    current: Option<Lead>,
    selected: Vec<LeadId>,
}

impl LeadMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn current(&self) -> Option<&Lead> {
        self.current.as_ref()
    }

    pub fn selected(&self) -> &[LeadId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn get(&self, id: LeadId) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    pub fn stats(&self) -> LeadStats {
        LeadStats::from_leads(&self.leads)
    }

    /// Drop everything and re-tag the mirror for `owner`.
    pub fn reset(&mut self, owner: Option<UserId>) {
        *self = Self {
            owner,
            ..Self::default()
        };
    }

    /// Replace the collection wholesale. Rows not owned by `owner` are dropped;
    /// the number dropped is returned.
    pub fn replace_all(&mut self, owner: UserId, rows: Vec<Lead>) -> usize {
        if self.owner != Some(owner) {
            self.reset(Some(owner));
        }
        let total = rows.len();
        self.leads = rows.into_iter().filter(|r| r.user_id == owner).collect();
        let leads = &self.leads;
        self.selected.retain(|id| leads.iter().any(|l| l.id == *id));
        if let Some(id) = self.current.as_ref().map(|c| c.id) {
            self.current = self.get(id).cloned();
        }
        total - self.leads.len()
    }

    /// Insert a freshly created row at the front.
    pub fn prepend(&mut self, lead: Lead) -> bool {
        if self.owner != Some(lead.user_id) {
            return false;
        }
        self.leads.insert(0, lead);
        true
    }

    /// Insert a batch of new rows at the front, newest first. Returns how many
    /// were accepted.
    pub fn prepend_many(&mut self, mut rows: Vec<Lead>) -> usize {
        let owner = self.owner;
        rows.retain(|r| Some(r.user_id) == owner);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let accepted = rows.len();
        self.leads.splice(0..0, rows);
        accepted
    }

    /// Replace the entry with the same id, and the current slot if it holds it.
    /// Returns whether a list entry was replaced.
    pub fn patch(&mut self, lead: Lead) -> bool {
        if self.owner != Some(lead.user_id) {
            return false;
        }
        if self.current.as_ref().is_some_and(|c| c.id == lead.id) {
            self.current = Some(lead.clone());
        }
        match self.leads.iter_mut().find(|l| l.id == lead.id) {
            Some(slot) => {
                *slot = lead;
                true
            }
            None => false,
        }
    }

    /// Remove an entry by id, clearing it from the current slot and selection.
    pub fn remove(&mut self, id: LeadId) -> bool {
        let before = self.leads.len();
        self.leads.retain(|l| l.id != id);
        self.selected.retain(|s| *s != id);
        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
        }
        self.leads.len() != before
    }

    pub fn set_current(&mut self, lead: Option<Lead>) {
        self.current = lead.filter(|l| self.owner == Some(l.user_id));
    }

    pub fn is_selected(&self, id: LeadId) -> bool {
        self.selected.contains(&id)
    }

    /// Mark `id` for bulk operations. Unknown ids are ignored.
    pub fn select(&mut self, id: LeadId) -> bool {
        if self.is_selected(id) || self.get(id).is_none() {
            return false;
        }
        self.selected.push(id);
        true
    }

    pub fn deselect(&mut self, id: LeadId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| *s != id);
        self.selected.len() != before
    }

    pub fn toggle(&mut self, id: LeadId) {
        if !self.deselect(id) {
            self.select(id);
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.leads.iter().map(|l| l.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadStatus, Priority, TargetType};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn lead(owner: UserId, name: &str, age_secs: i64) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            created_at: Utc::now() - Duration::seconds(age_secs),
            name: name.to_string(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            is_active: true,
            status: LeadStatus::Open,
            last_followup_remarks: None,
            next_steps: None,
            priority: Priority::Normal,
            target_type: TargetType::Target,
            user_id: owner,
        }
    }

    fn names(mirror: &LeadMirror) -> Vec<&str> {
        mirror.leads().iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_replace_all_drops_foreign_rows() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        let dropped = mirror.replace_all(
            me,
            vec![lead(me, "mine", 0), lead(Uuid::new_v4(), "theirs", 0)],
        );
        assert_eq!(dropped, 1);
        assert_eq!(names(&mirror), vec!["mine"]);
        assert_eq!(mirror.owner(), Some(me));
    }

    #[test]
    fn test_replace_all_for_new_owner_resets_selection_and_current() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        let a = lead(alice, "a", 0);
        mirror.replace_all(alice, vec![a.clone()]);
        mirror.select(a.id);
        mirror.set_current(Some(a));

        mirror.replace_all(bob, vec![lead(bob, "b", 0)]);
        assert!(mirror.selected().is_empty());
        assert!(mirror.current().is_none());
        assert_eq!(names(&mirror), vec!["b"]);
    }

    #[test]
    fn test_prepend_keeps_newest_first_and_refuses_foreign() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        mirror.replace_all(me, vec![lead(me, "old", 10)]);

        assert!(mirror.prepend(lead(me, "new", 0)));
        assert!(!mirror.prepend(lead(Uuid::new_v4(), "foreign", 0)));
        assert_eq!(names(&mirror), vec!["new", "old"]);
    }

    #[test]
    fn test_prepend_many_sorts_batch() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        mirror.replace_all(me, vec![lead(me, "old", 100)]);

        let accepted = mirror.prepend_many(vec![
            lead(me, "b", 5),
            lead(me, "a", 1),
            lead(Uuid::new_v4(), "x", 0),
        ]);
        assert_eq!(accepted, 2);
        assert_eq!(names(&mirror), vec!["a", "b", "old"]);
    }

    #[test]
    fn test_patch_updates_list_and_current() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        let a = lead(me, "a", 1);
        let b = lead(me, "b", 0);
        mirror.replace_all(me, vec![b.clone(), a.clone()]);
        mirror.set_current(Some(a.clone()));

        let mut closed = a.clone();
        closed.status = LeadStatus::Close;
        assert!(mirror.patch(closed));
        assert_eq!(names(&mirror), vec!["b", "a"]);
        assert_eq!(mirror.get(a.id).unwrap().status, LeadStatus::Close);
        assert_eq!(mirror.current().unwrap().status, LeadStatus::Close);
    }

    #[test]
    fn test_remove_clears_current_and_selection() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        let a = lead(me, "a", 0);
        mirror.replace_all(me, vec![a.clone()]);
        mirror.select(a.id);
        mirror.set_current(Some(a.clone()));

        assert!(mirror.remove(a.id));
        assert!(mirror.is_empty());
        assert!(mirror.current().is_none());
        assert!(mirror.selected().is_empty());
        assert!(!mirror.remove(a.id));
    }

    #[test]
    fn test_selection() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        let a = lead(me, "a", 0);
        let b = lead(me, "b", 0);
        mirror.replace_all(me, vec![a.clone(), b.clone()]);

        assert!(mirror.select(a.id));
        assert!(!mirror.select(a.id));
        assert!(!mirror.select(Uuid::new_v4()));
        mirror.toggle(b.id);
        assert_eq!(mirror.selected(), &[a.id, b.id]);
        mirror.toggle(a.id);
        assert_eq!(mirror.selected(), &[b.id]);
        mirror.select_all();
        assert_eq!(mirror.selected().len(), 2);
        mirror.clear_selection();
        assert!(mirror.selected().is_empty());
    }

    #[test]
    fn test_refetch_prunes_stale_selection() {
        let me = Uuid::new_v4();
        let mut mirror = LeadMirror::new();
        let a = lead(me, "a", 0);
        let b = lead(me, "b", 0);
        mirror.replace_all(me, vec![a.clone(), b.clone()]);
        mirror.select_all();

        mirror.replace_all(me, vec![b.clone()]);
        assert_eq!(mirror.selected(), &[b.id]);
    }
}
