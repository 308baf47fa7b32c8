use chrono::{Duration, Utc};
use tide::http::{headers, mime, Method, Request, Response, StatusCode, Url};

use pollbox::models::{Choice, NewQuestion, Question};
use pollbox::store::Store;
use pollbox::{urls, AppState};

struct Fixture {
    store: Store,
    app: tide::Server<AppState>,
}

impl Fixture {
    async fn new() -> Self {
        let store = Store::in_memory().await.expect("Failed to open store");
        let state = AppState::new(store.clone()).expect("Failed to compile templates");
        Fixture {
            store,
            app: urls::app(state),
        }
    }

    /**
     * Create a question published `days` from now, negative for the past
     */
    async fn create_question(&self, text: &str, days: i64, choices: &[&str]) -> (Question, Vec<Choice>) {
        let new = NewQuestion {
            text: text.into(),
            pub_date: Some(Utc::now() + Duration::days(days)),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        };
        self.store.create_question(&new).await.expect("Failed to create question")
    }

    async fn get(&self, path: &str) -> (StatusCode, String) {
        let req = Request::new(Method::Get, url(path));
        let mut res: Response = self.app.respond(req).await.unwrap();
        (res.status(), res.body_string().await.unwrap())
    }

    async fn post_form(&self, path: &str, form: &str) -> Response {
        let mut req = Request::new(Method::Post, url(path));
        req.set_body(form.to_string());
        req.set_content_type(mime::FORM);
        self.app.respond(req).await.unwrap()
    }
}

/**
 * The error message as it appears in the page, with the apostrophe escaped
 */
const NO_CHOICE_SELECTED: &str = "You didn&#x27;t select a choice.";

fn url(path: &str) -> Url {
    Url::parse("http://localhost").unwrap().join(path).unwrap()
}

fn position(page: &str, needle: &str) -> usize {
    page.find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in page", needle))
}

#[async_std::test]
async fn index_without_questions() {
    let fixture = Fixture::new().await;
    let (status, page) = fixture.get("/").await;
    assert_eq!(status, StatusCode::Ok);
    assert!(page.contains("No polls are available."));
}

#[async_std::test]
async fn index_shows_past_question() {
    let fixture = Fixture::new().await;
    let (question, _) = fixture.create_question("Past question.", -30, &[]).await;

    let (_, page) = fixture.get("/").await;
    assert!(page.contains(&format!(r#"<a href="/{}">Past question.</a>"#, question.id)));
    assert!(!page.contains("No polls are available."));
}

#[async_std::test]
async fn index_hides_future_question() {
    let fixture = Fixture::new().await;
    fixture.create_question("Future question.", 30, &[]).await;

    let (_, page) = fixture.get("/").await;
    assert!(page.contains("No polls are available."));
    assert!(!page.contains("Future question."));
}

#[async_std::test]
async fn index_shows_only_past_when_both_exist() {
    let fixture = Fixture::new().await;
    fixture.create_question("Past question.", -30, &[]).await;
    fixture.create_question("Future question.", 30, &[]).await;

    let (_, page) = fixture.get("/").await;
    assert!(page.contains("Past question."));
    assert!(!page.contains("Future question."));
}

#[async_std::test]
async fn index_orders_newest_first() {
    let fixture = Fixture::new().await;
    fixture.create_question("Past question 1.", -30, &[]).await;
    fixture.create_question("Past question 2.", -5, &[]).await;

    let (_, page) = fixture.get("/").await;
    assert!(position(&page, "Past question 2.") < position(&page, "Past question 1."));
}

#[async_std::test]
async fn index_shows_five_questions() {
    let fixture = Fixture::new().await;
    for day in 1..=6 {
        fixture
            .create_question(&format!("Question number {}.", day), -day, &[])
            .await;
    }

    let (_, page) = fixture.get("/").await;
    assert_eq!(page.matches("<li>").count(), 5);
    assert!(!page.contains("Question number 6."));
}

#[async_std::test]
async fn detail_of_future_question_is_not_found() {
    let fixture = Fixture::new().await;
    let (question, _) = fixture.create_question("Future question.", 5, &["A"]).await;

    let (status, _) = fixture.get(&format!("/{}", question.id)).await;
    assert_eq!(status, StatusCode::NotFound);
}

#[async_std::test]
async fn detail_of_past_question_shows_text() {
    let fixture = Fixture::new().await;
    let (question, _) = fixture
        .create_question("Past Question.", -5, &["Yes", "No"])
        .await;

    let (status, page) = fixture.get(&format!("/{}", question.id)).await;
    assert_eq!(status, StatusCode::Ok);
    assert!(page.contains("Past Question."));
    assert!(page.contains("Yes"));
    assert!(page.contains(&format!(r#"action="/{}/vote""#, question.id)));
}

#[async_std::test]
async fn unknown_question_is_not_found() {
    let fixture = Fixture::new().await;
    assert_eq!(fixture.get("/41").await.0, StatusCode::NotFound);
    assert_eq!(fixture.get("/41/results").await.0, StatusCode::NotFound);
    assert_eq!(fixture.get("/not-an-id").await.0, StatusCode::NotFound);
}

#[async_std::test]
async fn results_of_future_question_is_not_found() {
    let fixture = Fixture::new().await;
    let (question, _) = fixture.create_question("Future question.", 5, &["A"]).await;

    let (status, _) = fixture.get(&format!("/{}/results", question.id)).await;
    assert_eq!(status, StatusCode::NotFound);
}

#[async_std::test]
async fn vote_redirects_to_results() {
    let fixture = Fixture::new().await;
    let (question, choices) = fixture
        .create_question("Tabs or spaces", -1, &["Tabs", "Spaces"])
        .await;

    let res = fixture
        .post_form(
            &format!("/{}/vote", question.id),
            &format!("choice={}", choices[0].id),
        )
        .await;
    assert_eq!(res.status(), StatusCode::SeeOther);
    let location = res.header(headers::LOCATION).unwrap().as_str().to_string();
    assert_eq!(location, format!("/{}/results", question.id));

    let (status, page) = fixture.get(&location).await;
    assert_eq!(status, StatusCode::Ok);
    assert!(page.contains("Tabs -- 1 vote<"));
    assert!(page.contains("Spaces -- 0 votes<"));
}

#[async_std::test]
async fn trailing_slash_paths_are_served() {
    let fixture = Fixture::new().await;
    let (question, choices) = fixture.create_question("Tabs or spaces", -1, &["Tabs"]).await;

    let (status, page) = fixture.get(&format!("/{}/", question.id)).await;
    assert_eq!(status, StatusCode::Ok);
    assert!(page.contains("Tabs or spaces"));

    let res = fixture
        .post_form(
            &format!("/{}/vote/", question.id),
            &format!("choice={}", choices[0].id),
        )
        .await;
    assert_eq!(res.status(), StatusCode::SeeOther);

    let (status, page) = fixture.get(&format!("/{}/results/", question.id)).await;
    assert_eq!(status, StatusCode::Ok);
    assert!(page.contains("Tabs -- 1 vote<"));
}

#[async_std::test]
async fn vote_without_choice_redisplays_form() {
    let fixture = Fixture::new().await;
    let (question, _) = fixture
        .create_question("Tabs or spaces", -1, &["Tabs", "Spaces"])
        .await;

    let mut res = fixture.post_form(&format!("/{}/vote", question.id), "").await;
    assert_eq!(res.status(), StatusCode::Ok);
    let page = res.body_string().await.unwrap();
    assert!(page.contains(NO_CHOICE_SELECTED));
    assert!(page.contains("Tabs or spaces"));

    let votes: Vec<i64> = fixture
        .store
        .choices(question.id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.votes)
        .collect();
    assert_eq!(votes, vec![0, 0]);
}

#[async_std::test]
async fn vote_for_foreign_choice_redisplays_form() {
    let fixture = Fixture::new().await;
    let (question, _) = fixture.create_question("First", -1, &["A"]).await;
    let (_, other) = fixture.create_question("Second", -1, &["B"]).await;

    let mut res = fixture
        .post_form(
            &format!("/{}/vote", question.id),
            &format!("choice={}", other[0].id),
        )
        .await;
    assert_eq!(res.status(), StatusCode::Ok);
    assert!(res
        .body_string()
        .await
        .unwrap()
        .contains(NO_CHOICE_SELECTED));
    assert_eq!(fixture.store.choices(other[0].question_id).await.unwrap()[0].votes, 0);
}

#[async_std::test]
async fn vote_on_future_question_is_not_found() {
    let fixture = Fixture::new().await;
    let (question, choices) = fixture.create_question("Later", 3, &["A"]).await;

    let res = fixture
        .post_form(
            &format!("/{}/vote", question.id),
            &format!("choice={}", choices[0].id),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NotFound);
    assert_eq!(fixture.store.choices(question.id).await.unwrap()[0].votes, 0);
}
