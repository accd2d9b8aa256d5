//! This crate contains all shared UI for the workspace.

pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod auth;
pub use auth::{use_auth, use_backend, use_leads, AuthProvider, Backend, LogoutButton};

mod storage;

mod navbar;
pub use navbar::{ErrorNotice, Navbar};

mod stats;
pub use stats::StatsCards;

mod lead_table;
pub use lead_table::LeadTable;

mod lead_form;
pub use lead_form::LeadForm;

mod csv_upload;
pub use csv_upload::{parse_csv, CsvUpload};
