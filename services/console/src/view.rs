//! Bootstrap view selector

/// What the console should present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// A status check is still running
    Loading,
    /// No database configuration accepted yet
    DatabaseSetup,
    /// Database configured, first owner missing
    RegisterOwner,
    Login,
    Dashboard,
}

impl View {
    /// Pick the view for the current bootstrap flags
    ///
    /// Setup stages come first: a session restored from storage does not skip
    /// database setup or owner registration.
    pub fn select(
        checking: bool,
        is_configured: bool,
        has_owner: bool,
        is_authenticated: bool,
    ) -> View {
        match (checking, is_configured, has_owner, is_authenticated) {
            (true, ..) => View::Loading,
            (false, false, ..) => View::DatabaseSetup,
            (false, true, false, _) => View::RegisterOwner,
            (false, true, true, false) => View::Login,
            (false, true, true, true) => View::Dashboard,
        }
    }

    /// Login is offered only once setup is complete
    pub fn allows_login(self) -> bool {
        matches!(self, View::Login | View::Dashboard)
    }

    pub fn describe(self) -> &'static str {
        match self {
            View::Loading => "Checking system status...",
            View::DatabaseSetup => "Let's set up your database connection.",
            View::RegisterOwner => "Create the first owner account for your system.",
            View::Login => "Please sign in to continue.",
            View::Dashboard => "Signed in.",
        }
    }
}
