//! # Remote lead table: the data-store seam
//!
//! [`LeadTable`] is the async interface every lead operation goes through. It
//! models a hosted relational table with row-level security: each call carries
//! the [`Caller`] whose bearer token the server uses to decide row visibility,
//! and a [`Filter`] that the client applies redundantly on top of it.
//!
//! Implementations live in sibling modules ([`crate::memory`]) and in the `api`
//! crate (the hosted REST client).
//!
//! | Method | Semantics |
//! |--------|-----------|
//! | [`select`](LeadTable::select) | Every row matching the filter, in the requested order. |
//! | [`select_single`](LeadTable::select_single) | Exactly one matching row; [`TableError::NoRows`] or [`TableError::MultipleRows`] otherwise. |
//! | [`insert`](LeadTable::insert) | Inserts a batch and returns the server's rows (ids and timestamps assigned). |
//! | [`update`](LeadTable::update) | Patches every matching row and returns the updated rows. |
//! | [`delete`](LeadTable::delete) | Deletes every matching row and returns the deleted rows. |
//!
//! A filter that matches nothing is not an error for `update`/`delete`; the
//! empty result is what callers use to detect "not found or not yours".

use crate::filter::{Filter, Order};
use crate::models::{Caller, Lead, LeadPatch, NewLead};

/// Failure reported by a [`LeadTable`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("no rows matched")]
    NoRows,
    #[error("expected a single row, found {0}")]
    MultipleRows(usize),
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Async interface to the remote `leads` table.
pub trait LeadTable {
    fn select(
        &self,
        caller: &Caller,
        filter: &Filter,
        order: Order,
    ) -> impl std::future::Future<Output = Result<Vec<Lead>, TableError>>;
    fn select_single(
        &self,
        caller: &Caller,
        filter: &Filter,
    ) -> impl std::future::Future<Output = Result<Lead, TableError>>;
    fn insert(
        &self,
        caller: &Caller,
        rows: &[NewLead],
    ) -> impl std::future::Future<Output = Result<Vec<Lead>, TableError>>;
    fn update(
        &self,
        caller: &Caller,
        filter: &Filter,
        patch: &LeadPatch,
    ) -> impl std::future::Future<Output = Result<Vec<Lead>, TableError>>;
    fn delete(
        &self,
        caller: &Caller,
        filter: &Filter,
    ) -> impl std::future::Future<Output = Result<Vec<Lead>, TableError>>;
}

/// Reduce a result set to its only row.
pub fn expect_single(mut rows: Vec<Lead>) -> Result<Lead, TableError> {
    match rows.len() {
        0 => Err(TableError::NoRows),
        1 => Ok(rows.remove(0)),
        n => Err(TableError::MultipleRows(n)),
    }
}
