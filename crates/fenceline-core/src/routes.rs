/// The views the assistant can send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Dashboard,
    Quotes,
    Customers,
    Schedule,
    Settings,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Dashboard,
        Route::Quotes,
        Route::Customers,
        Route::Schedule,
        Route::Settings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Route::Dashboard => "dashboard",
            Route::Quotes => "quotes",
            Route::Customers => "customers",
            Route::Schedule => "schedule",
            Route::Settings => "settings",
        }
    }

    /// Canonical absolute path
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Quotes => "/quotes",
            Route::Customers => "/customers",
            Route::Schedule => "/schedule",
            Route::Settings => "/settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Quotes => "Quotes",
            Route::Customers => "Customers",
            Route::Schedule => "Schedule",
            Route::Settings => "Settings",
        }
    }

    /// Match a path (with or without leading slash, any case) to a route
    pub fn from_path(path: &str) -> Option<Route> {
        let name = path.trim().trim_start_matches('/').trim_end_matches('/');
        Route::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }
}

/// Make a model-supplied navigation target an absolute path.
///
/// Models sometimes answer with a bare route name (`"quotes"`); those get a
/// leading `/`. Anything else is passed through untouched.
pub fn normalize_navigation(target: &str) -> String {
    let target = target.trim();
    if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{}", target)
    }
}

/// Human name for a path, for "taking you to ..." messages
pub fn display_name(path: &str) -> String {
    match Route::from_path(path) {
        Some(route) => route.name().to_string(),
        None => path.trim_start_matches('/').to_string(),
    }
}
