pub mod filter;
pub mod import;
pub mod mirror;
pub mod models;
pub mod repo;

mod memory;
pub use memory::MemoryTable;

pub use filter::{Column, Condition, Filter, Order};
pub use import::{coerce_rows, Coerced, ImportRow, ImportWarning};
pub use mirror::LeadMirror;
pub use models::{
    Caller, Lead, LeadFields, LeadId, LeadPatch, LeadStats, LeadStatus, NewLead, Priority,
    TargetType, UserId,
};
pub use repo::{LeadTable, TableError};
