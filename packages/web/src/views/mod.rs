mod login;
pub use login::Login;

mod register;
pub use register::Register;

mod dashboard;
pub use dashboard::Dashboard;

mod leads;
pub use leads::Leads;

mod lead_detail;
pub use lead_detail::{EditLead, LeadDetail, NewLead};

mod upload;
pub use upload::UploadCsv;

mod admin;
pub use admin::AdminDashboard;

mod not_found;
pub use not_found::NotFound;
