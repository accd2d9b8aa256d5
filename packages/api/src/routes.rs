//! Navigation targets and the authorization gate consulted before each one.

use crate::authority::Identity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    Dashboard,
    Leads,
    NewLead,
    LeadDetail,
    EditLead,
    UploadCsv,
    AdminDashboard,
    Login,
    Register,
    NotFound,
}

/// Where an authenticated user lands by default.
pub const LANDING: Page = Page::Dashboard;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Access {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Allow,
    Redirect(Page),
}

impl Page {
    pub const ALL: [Page; 10] = [
        Page::Dashboard,
        Page::Leads,
        Page::NewLead,
        Page::LeadDetail,
        Page::EditLead,
        Page::UploadCsv,
        Page::AdminDashboard,
        Page::Login,
        Page::Register,
        Page::NotFound,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Leads => "leads",
            Page::NewLead => "new-lead",
            Page::LeadDetail => "lead-detail",
            Page::EditLead => "edit-lead",
            Page::UploadCsv => "upload-csv",
            Page::AdminDashboard => "admin-dashboard",
            Page::Login => "login",
            Page::Register => "register",
            Page::NotFound => "not-found",
        }
    }

    /// Route pattern, with `:id` for the lead id.
    pub fn path(&self) -> &'static str {
        match self {
            Page::Dashboard => "/dashboard",
            Page::Leads => "/leads",
            Page::NewLead => "/leads/new",
            Page::LeadDetail => "/leads/:id",
            Page::EditLead => "/leads/:id/edit",
            Page::UploadCsv => "/upload",
            Page::AdminDashboard => "/admin",
            Page::Login => "/login",
            Page::Register => "/register",
            Page::NotFound => "/:..route",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Page::Login | Page::Register | Page::NotFound => Access::default(),
            Page::AdminDashboard => Access {
                requires_auth: true,
                requires_admin: true,
            },
            _ => Access {
                requires_auth: true,
                requires_admin: false,
            },
        }
    }
}

/// Decide whether `identity` may enter `target`.
///
/// Checked in this order: missing authentication sends to the login page, a
/// missing admin flag sends to the landing page, and a signed-in user asking
/// for the login page is sent to the landing page.
pub fn gate(target: Page, identity: Option<&Identity>) -> Gate {
    let access = target.access();
    match identity {
        None if access.requires_auth => Gate::Redirect(Page::Login),
        Some(id) if access.requires_admin && !id.is_admin => Gate::Redirect(LANDING),
        Some(_) if target == Page::Login => Gate::Redirect(LANDING),
        _ => Gate::Allow,
    }
}
