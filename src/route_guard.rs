use crate::session::Session;

pub const LOGIN_ROUTE: &str = "/login";

/// Protected pages, in sidebar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Ingredients,
    Recipes,
    Orders,
    Reports,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Ingredients,
        Page::Recipes,
        Page::Orders,
        Page::Reports,
    ];

    pub fn route(&self) -> &'static str {
        match self {
            Page::Dashboard => "/dashboard",
            Page::Ingredients => "/ingredients",
            Page::Recipes => "/recipes",
            Page::Orders => "/orders",
            Page::Reports => "/reports",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Ingredients => "Ingredientes",
            Page::Recipes => "Recetas",
            Page::Orders => "Pedidos",
            Page::Reports => "Reportes",
        }
    }

    /// Pages that keep a push channel open while mounted.
    pub fn wants_live_updates(&self) -> bool {
        matches!(self, Page::Dashboard | Page::Orders)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Identity resolution still pending; show the loading placeholder.
    Loading,
    Render,
    RedirectToLogin,
}

/// No retry and no timeout: a hung identity call keeps the guard in `Loading`.
pub fn guard(session: &Session) -> GuardState {
    if session.is_loading() {
        GuardState::Loading
    } else if session.is_authenticated() {
        GuardState::Render
    } else {
        GuardState::RedirectToLogin
    }
}
