use serde::Serialize;
use serde_json::{Map, Value};

use crate::admin::{Fieldset, InlineAdmin};

/**
 * A question along with all of its choices
 */
#[derive(Debug, Serialize)]
pub struct Poll {
    pub question: crate::models::Question,
    pub choices: Vec<crate::models::Choice>,
}

/**
 * One page of the admin change list
 */
#[derive(Debug, Serialize)]
pub struct Changelist {
    pub model: &'static str,
    pub list_display: Vec<&'static str>,
    pub list_filter: Vec<&'static str>,
    pub search_fields: Vec<&'static str>,
    pub count: usize,
    /**
     * Each row carries `id` plus one entry per `list_display` column
     */
    pub results: Vec<Map<String, Value>>,
}

/**
 * Everything a client needs to draw a blank add form
 */
#[derive(Debug, Serialize)]
pub struct AddForm {
    pub model: &'static str,
    pub fieldsets: Vec<Fieldset>,
    pub inlines: Vec<InlineForms>,
}

#[derive(Debug, Serialize)]
pub struct InlineForms {
    #[serde(flatten)]
    pub inline: InlineAdmin,
    /**
     * One empty slot per `extra`
     */
    pub forms: Vec<Map<String, Value>>,
}
