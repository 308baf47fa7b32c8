//! The admin module describes how each model is presented to administrators.
//!
//! Registrations live in an `AdminSite` value that is built once at start-up and carried in the
//! application state, there is no global registry to mutate.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::BTreeMap;

use crate::models::Question;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: Vec<&'static str>,
    pub collapsed: bool,
}

/**
 * Related objects edited on the same page as their parent, in a compact tabular layout
 */
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InlineAdmin {
    pub model: &'static str,
    pub fields: Vec<&'static str>,
    /**
     * Number of blank rows offered on the add form
     */
    pub extra: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    pub list_display: Vec<&'static str>,
    pub list_filter: Vec<&'static str>,
    pub search_fields: Vec<&'static str>,
    pub fieldsets: Vec<Fieldset>,
    pub inlines: Vec<InlineAdmin>,
}

impl ModelAdmin {
    pub fn new(model: &'static str) -> Self {
        ModelAdmin {
            model,
            list_display: vec!["id"],
            list_filter: vec![],
            search_fields: vec![],
            fieldsets: vec![],
            inlines: vec![],
        }
    }

    pub fn with_list_display(mut self, fields: Vec<&'static str>) -> Self {
        self.list_display = fields;
        self
    }

    pub fn with_list_filter(mut self, fields: Vec<&'static str>) -> Self {
        self.list_filter = fields;
        self
    }

    pub fn with_search_fields(mut self, fields: Vec<&'static str>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn with_fieldset(
        mut self,
        name: Option<&'static str>,
        fields: Vec<&'static str>,
        collapsed: bool,
    ) -> Self {
        self.fieldsets.push(Fieldset {
            name,
            fields,
            collapsed,
        });
        self
    }

    pub fn with_inline(mut self, inline: InlineAdmin) -> Self {
        self.inlines.push(inline);
        self
    }

    /**
     * Render a question as a change list row, one entry per `list_display` column
     */
    pub fn row(&self, question: &Question, now: DateTime<Utc>) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("id".into(), Value::from(question.id));
        for field in self.list_display.iter() {
            let value = match *field {
                "id" => Value::from(question.id),
                "text" => Value::from(question.text.as_str()),
                "pub_date" => Value::from(question.pub_date.to_rfc3339()),
                "was_published_recently" => Value::from(question.is_recent(now)),
                _ => Value::Null,
            };
            row.insert(field.to_string(), value);
        }
        row
    }
}

#[derive(Clone, Debug, Default)]
pub struct AdminSite {
    registry: BTreeMap<&'static str, ModelAdmin>,
}

impl AdminSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, admin: ModelAdmin) -> Self {
        self.registry.insert(admin.model, admin);
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelAdmin> {
        self.registry.get(model)
    }

    /**
     * The site used by the polls application
     */
    pub fn polls() -> Self {
        AdminSite::new().register(
            ModelAdmin::new("question")
                .with_fieldset(None, vec!["text"], false)
                .with_fieldset(Some("Date information"), vec!["pub_date"], true)
                .with_inline(InlineAdmin {
                    model: "choice",
                    fields: vec!["text", "votes"],
                    extra: 3,
                })
                .with_list_display(vec!["text", "pub_date", "was_published_recently"])
                .with_list_filter(vec!["pub_date"])
                .with_search_fields(vec!["text"]),
        )
    }
}

/**
 * Date hierarchy filter for the change list, bounds are whole UTC days
 */
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    Any,
    Today,
    #[serde(rename = "past_7_days")]
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl Default for DateFilter {
    fn default() -> Self {
        DateFilter::Any
    }
}

impl DateFilter {
    /**
     * The half-open `[start, end)` window selected relative to `now`
     */
    pub fn range(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let (start, end) = match self {
            DateFilter::Any => return None,
            DateFilter::Today => (today, today.succ_opt()?),
            DateFilter::Past7Days => (today - Duration::days(7), today.succ_opt()?),
            DateFilter::ThisMonth => {
                let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
                let end = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                (start, end)
            }
            DateFilter::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
            ),
        };
        Some((midnight(start)?, midnight(end)?))
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangelistQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub pub_date: DateFilter,
}

pub mod routes {
    use chrono::Utc;
    use log::*;
    use serde_json::{Map, Value};
    use tide::{Body, Request, Response, StatusCode};

    use super::{ChangelistQuery, ModelAdmin};
    use crate::api_models::{AddForm, Changelist, InlineForms, Poll};
    use crate::models::NewQuestion;
    use crate::routes::{not_found, question_id};
    use crate::AppState;

    fn question_admin(req: &Request<AppState>) -> tide::Result<&ModelAdmin> {
        req.state().admin.get("question").ok_or_else(|| {
            tide::Error::from_str(StatusCode::NotFound, "question is not registered with the admin")
        })
    }

    /**
     *  GET /admin/questions
     */
    pub async fn changelist(req: Request<AppState>) -> tide::Result<Body> {
        let admin = question_admin(&req)?;
        let query: ChangelistQuery = serde_qs::from_str(req.url().query().unwrap_or(""))
            .map_err(|err| {
                debug!("Rejecting change list query: {}", err);
                tide::Error::from_str(StatusCode::BadRequest, "Invalid change list query")
            })?;

        let now = Utc::now();
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty() && !admin.search_fields.is_empty());
        let range = if admin.list_filter.contains(&"pub_date") {
            query.pub_date.range(now)
        } else {
            None
        };

        let questions = req.state().store.search_questions(search, range).await?;
        let results: Vec<Map<String, Value>> = questions.iter().map(|q| admin.row(q, now)).collect();

        Body::from_json(&Changelist {
            model: admin.model,
            list_display: admin.list_display.clone(),
            list_filter: admin.list_filter.clone(),
            search_fields: admin.search_fields.clone(),
            count: results.len(),
            results,
        })
    }

    /**
     *  GET /admin/questions/new
     */
    pub async fn add_form(req: Request<AppState>) -> tide::Result<Body> {
        let admin = question_admin(&req)?;
        let inlines = admin
            .inlines
            .iter()
            .map(|inline| {
                let blank: Map<String, Value> = inline
                    .fields
                    .iter()
                    .map(|field| (field.to_string(), Value::Null))
                    .collect();
                InlineForms {
                    inline: inline.clone(),
                    forms: vec![blank; inline.extra],
                }
            })
            .collect();

        Body::from_json(&AddForm {
            model: admin.model,
            fieldsets: admin.fieldsets.clone(),
            inlines,
        })
    }

    /**
     *  POST /admin/questions
     */
    pub async fn add(mut req: Request<AppState>) -> tide::Result<Response> {
        let new: NewQuestion = req.body_json().await.map_err(|err| {
            debug!("Rejecting question payload: {}", err);
            tide::Error::from_str(StatusCode::BadRequest, "Malformed question payload")
        })?;
        let new = new
            .validate()
            .map_err(|err| tide::Error::from_str(StatusCode::BadRequest, err.to_string()))?;

        match req.state().store.create_question(&new).await {
            Ok((question, choices)) => {
                info!("Created question {} with {} choices", question.id, choices.len());
                Ok(Response::builder(StatusCode::Created)
                    .body(Body::from_json(&Poll { question, choices })?)
                    .build())
            }
            Err(err) => {
                error!("Failed to insert: {:?}", err);
                Err(tide::Error::from_str(
                    StatusCode::InternalServerError,
                    "Failed to create",
                ))
            }
        }
    }

    /**
     *  DELETE /admin/questions/:question_id
     */
    pub async fn delete(req: Request<AppState>) -> tide::Result<Response> {
        let id = question_id(&req)?;
        let store = &req.state().store;
        let question = store.question(id).await?.ok_or_else(not_found)?;

        if store.delete_question(question.id).await? {
            info!("Deleted question {}: {:?}", question.id, question.text);
            Ok(Response::new(StatusCode::NoContent))
        } else {
            debug!("Question {} was deleted concurrently", question.id);
            Err(not_found())
        }
    }
}
