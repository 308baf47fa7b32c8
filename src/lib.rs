use std::sync::Arc;

pub mod admin;
pub mod api_models;
pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod templates;
pub mod urls;

use admin::AdminSite;
use store::Store;
use templates::Templates;

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Store,
    pub templates: Arc<Templates>,
    pub admin: Arc<AdminSite>,
}

impl AppState {
    /**
     * Compile the templates and build the admin registry around an existing store
     */
    pub fn new(store: Store) -> Result<Self, handlebars::TemplateError> {
        Ok(AppState {
            store,
            templates: Arc::new(Templates::new()?),
            admin: Arc::new(AdminSite::polls()),
        })
    }
}
