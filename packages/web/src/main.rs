use api::{gate, Gate, Page};
use dioxus::prelude::*;
use store::LeadId;

use ui::{use_auth, AuthProvider, Navbar};
use views::{
    AdminDashboard, Dashboard, EditLead, LeadDetail, Leads, Login, NewLead, NotFound, Register,
    UploadCsv,
};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Guard)]
        #[route("/")]
        Root {},
        #[route("/dashboard")]
        Dashboard {},
        #[route("/leads")]
        Leads {},
        #[route("/leads/new")]
        NewLead {},
        #[route("/leads/:id")]
        LeadDetail { id: LeadId },
        #[route("/leads/:id/edit")]
        EditLead { id: LeadId },
        #[route("/upload")]
        UploadCsv {},
        #[route("/admin")]
        AdminDashboard {},
        #[route("/login")]
        Login {},
        #[route("/register")]
        Register {},
        #[route("/:..route")]
        NotFound { route: Vec<String> },
}

impl Route {
    fn page(&self) -> Page {
        match self {
            Route::Root {} | Route::Dashboard {} => Page::Dashboard,
            Route::Leads {} => Page::Leads,
            Route::NewLead {} => Page::NewLead,
            Route::LeadDetail { .. } => Page::LeadDetail,
            Route::EditLead { .. } => Page::EditLead,
            Route::UploadCsv {} => Page::UploadCsv,
            Route::AdminDashboard {} => Page::AdminDashboard,
            Route::Login {} => Page::Login,
            Route::Register {} => Page::Register,
            Route::NotFound { .. } => Page::NotFound,
        }
    }

    /// Route for a page without parameters. Lead pages fall back to the list.
    fn for_page(page: Page) -> Self {
        match page {
            Page::Dashboard => Route::Dashboard {},
            Page::Leads | Page::LeadDetail | Page::EditLead => Route::Leads {},
            Page::NewLead => Route::NewLead {},
            Page::UploadCsv => Route::UploadCsv {},
            Page::AdminDashboard => Route::AdminDashboard {},
            Page::Login => Route::Login {},
            Page::Register => Route::Register {},
            Page::NotFound => Route::NotFound { route: Vec::new() },
        }
    }
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        AuthProvider {
            Router::<Route> {}
        }
    }
}

/// Applies the authorization gate before rendering any page.
#[component]
fn Guard() -> Element {
    let auth = use_auth();
    let route = use_route::<Route>();
    let nav = use_navigator();

    let state = auth();
    if !state.restored {
        return rsx! {
            div { class: "splash", "Loading..." }
        };
    }

    let identity = state.identity();
    let target = route.page();
    if let Gate::Redirect(page) = gate(target, identity.as_ref()) {
        tracing::debug!(from = target.name(), to = page.name(), "navigation redirected");
        nav.replace(Route::for_page(page));
        return rsx! {};
    }

    rsx! {
        if identity.is_some() {
            Navbar {
                Link { to: Route::Dashboard {}, "Dashboard" }
                Link { to: Route::Leads {}, "Leads" }
                Link { to: Route::UploadCsv {}, "Upload CSV" }
                if identity.as_ref().is_some_and(|i| i.is_admin) {
                    Link { to: Route::AdminDashboard {}, "Admin" }
                }
            }
        }
        main {
            class: "content",
            Outlet::<Route> {}
        }
    }
}

/// Redirect `/` to `/dashboard`
#[component]
fn Root() -> Element {
    let nav = use_navigator();
    nav.replace(Route::Dashboard {});
    rsx! {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_page_has_a_route() {
        for page in Page::ALL {
            let route = Route::for_page(page);
            match page {
                Page::LeadDetail | Page::EditLead => assert_eq!(route.page(), Page::Leads),
                _ => assert_eq!(route.page(), page),
            }
        }
    }

    #[test]
    fn test_route_paths_match_pages() {
        let id = LeadId::from_u128(5);
        assert_eq!(Route::LeadDetail { id }.to_string(), format!("/leads/{id}"));
        assert_eq!(Route::EditLead { id }.to_string(), format!("/leads/{id}/edit"));
        for page in [
            Page::Dashboard,
            Page::Leads,
            Page::NewLead,
            Page::UploadCsv,
            Page::AdminDashboard,
            Page::Login,
            Page::Register,
        ] {
            assert_eq!(Route::for_page(page).to_string(), page.path());
        }
    }
}
