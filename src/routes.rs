//! The routes module contains the public poll pages and the logic to fulfill the responses for
//! each of them.
//!
//! The detail and results pages differ only in their template, so both go through
//! `question_page`.

use chrono::Utc;
use log::*;
use serde::{Deserialize, Serialize};
use tide::{Redirect, Request, Response, StatusCode};

use crate::models::{Choice, Question};
use crate::store::VoteError;
use crate::templates;
use crate::urls::{self, Route};
use crate::AppState;

/**
 * Number of questions shown on the index page
 */
pub const INDEX_LIMIT: i64 = 5;

pub const NO_CHOICE_SELECTED: &str = "You didn't select a choice.";

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub latest_question_list: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct QuestionContext {
    pub question: Question,
    pub choices: Vec<Choice>,
    pub error_message: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct VoteForm {
    choice: Option<String>,
}

pub(crate) fn not_found() -> tide::Error {
    tide::Error::from_str(StatusCode::NotFound, "No question matches the given query.")
}

/**
 * Parse the `:question_id` route parameter, anything that isn't an id simply matches nothing
 */
pub(crate) fn question_id(req: &Request<AppState>) -> tide::Result<i64> {
    req.param("question_id")?.parse().map_err(|_| not_found())
}

fn render<T: Serialize>(state: &AppState, template: &str, context: &T) -> tide::Result {
    let page = state.templates.render(template, context)?;
    Ok(Response::builder(StatusCode::Ok)
        .body(page)
        .content_type(tide::http::mime::HTML)
        .build())
}

/**
 * Load a published question with its choices, or None if it isn't visible yet
 */
async fn question_context(
    state: &AppState,
    id: i64,
    error_message: Option<&'static str>,
) -> tide::Result<Option<QuestionContext>> {
    match state.store.published_question(id, Utc::now()).await? {
        Some(question) => {
            let choices = state.store.choices(question.id).await?;
            Ok(Some(QuestionContext {
                question,
                choices,
                error_message,
            }))
        }
        None => Ok(None),
    }
}

async fn question_page(req: &Request<AppState>, template: &str) -> tide::Result {
    let id = question_id(req)?;
    let state = req.state();

    match question_context(state, id, None).await? {
        Some(context) => render(state, template, &context),
        None => {
            debug!("Question {} is not published or does not exist", id);
            Err(not_found())
        }
    }
}

/**
 *  GET /
 */
pub async fn index(req: Request<AppState>) -> tide::Result {
    let state = req.state();
    let latest_question_list = state.store.latest_published(Utc::now(), INDEX_LIMIT).await?;
    render(state, templates::INDEX, &IndexContext { latest_question_list })
}

/**
 *  GET /:question_id
 */
pub async fn detail(req: Request<AppState>) -> tide::Result {
    question_page(&req, templates::DETAIL).await
}

/**
 *  GET /:question_id/results
 */
pub async fn results(req: Request<AppState>) -> tide::Result {
    question_page(&req, templates::RESULTS).await
}

/**
 *  POST /:question_id/vote
 *
 * A successful vote always answers with a redirect so that reloading the results page or
 * navigating back never submits the form a second time.
 */
pub async fn vote(mut req: Request<AppState>) -> tide::Result {
    let id = question_id(&req)?;
    let body = req.body_string().await?;
    let form: VoteForm = serde_qs::from_str(&body).map_err(|err| {
        warn!("Malformed vote submission for question {}: {}", id, err);
        tide::Error::from_str(StatusCode::BadRequest, "Malformed vote submission")
    })?;

    let state = req.state();
    match state.store.vote(id, form.choice.as_deref(), Utc::now()).await {
        Ok(votes) => {
            info!("Vote counted on question {}, choice now has {} votes", id, votes);
            Ok(Redirect::see_other(urls::reverse(Route::Results, Some(id))).into())
        }
        Err(VoteError::NotFound) => Err(not_found()),
        Err(VoteError::MissingSelection) | Err(VoteError::InvalidChoice) => {
            debug!("Redisplaying question {} with {:?}", id, form.choice);
            match question_context(state, id, Some(NO_CHOICE_SELECTED)).await? {
                Some(context) => render(state, templates::DETAIL, &context),
                None => Err(not_found()),
            }
        }
        Err(VoteError::Database(err)) => {
            error!("Failed to record vote on question {}: {:?}", id, err);
            Err(tide::Error::from_str(
                StatusCode::InternalServerError,
                "Failed to vote",
            ))
        }
    }
}
