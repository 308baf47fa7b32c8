//! The urls module is the single table of contents for the application's routes.
//!
//! Handlers and templates refer to routes by name and build paths through `reverse` rather than
//! hard-coding them.

use crate::{admin, routes, AppState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Route {
    Index,
    Detail,
    Results,
    Vote,
    AdminChangelist,
    AdminAddForm,
    AdminAdd,
    AdminDelete,
}

pub const ROUTES: &[Route] = &[
    Route::Index,
    Route::Detail,
    Route::Results,
    Route::Vote,
    Route::AdminChangelist,
    Route::AdminAddForm,
    Route::AdminAdd,
    Route::AdminDelete,
];

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Index => "polls:index",
            Route::Detail => "polls:detail",
            Route::Results => "polls:results",
            Route::Vote => "polls:vote",
            Route::AdminChangelist => "admin:changelist",
            Route::AdminAddForm => "admin:add_form",
            Route::AdminAdd => "admin:add",
            Route::AdminDelete => "admin:delete",
        }
    }

    /**
     * The tide path pattern, `:question_id` is the only parameter any route takes
     */
    pub fn pattern(&self) -> &'static str {
        match self {
            Route::Index => "/",
            Route::Detail => "/:question_id",
            Route::Results => "/:question_id/results",
            Route::Vote => "/:question_id/vote",
            Route::AdminChangelist | Route::AdminAdd => "/admin/questions",
            Route::AdminAddForm => "/admin/questions/new",
            Route::AdminDelete => "/admin/questions/:question_id",
        }
    }

    pub fn from_name(name: &str) -> Option<Route> {
        ROUTES.iter().copied().find(|route| route.name() == name)
    }
}

/**
 * Build the path for a route, substituting the question id where the pattern needs one
 */
pub fn reverse(route: Route, question_id: Option<i64>) -> String {
    let pattern = route.pattern();
    match question_id {
        Some(id) => pattern.replace(":question_id", &id.to_string()),
        None => pattern.to_string(),
    }
}

pub fn reverse_named(name: &str, question_id: i64) -> Option<String> {
    Route::from_name(name).map(|route| reverse(route, Some(question_id)))
}

/**
 * The canonical pattern and its trailing slash form, older links to the public pages carry the
 * slash
 */
fn paths(route: Route) -> [String; 2] {
    let pattern = route.pattern();
    [pattern.to_string(), format!("{}/", pattern)]
}

/**
 * Construct the tide application with every route registered against the given state
 */
pub fn app(state: AppState) -> tide::Server<AppState> {
    let mut app = tide::with_state(state);
    app.at(Route::Index.pattern()).get(routes::index);
    for path in paths(Route::Detail).iter() {
        app.at(path).get(routes::detail);
    }
    for path in paths(Route::Results).iter() {
        app.at(path).get(routes::results);
    }
    for path in paths(Route::Vote).iter() {
        app.at(path).post(routes::vote);
    }
    app.at(Route::AdminChangelist.pattern())
        .get(admin::routes::changelist)
        .post(admin::routes::add);
    app.at(Route::AdminAddForm.pattern()).get(admin::routes::add_form);
    app.at(Route::AdminDelete.pattern()).delete(admin::routes::delete);
    app
}
