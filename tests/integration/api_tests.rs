//! API integration tests

use axum::http::{header::LOCATION, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use catalog_server::config::{DeletePolicy, IntegrityConfig};

use crate::common::{app, app_with, create, delete, get, post, put};

fn jane_austen() -> Value {
    json!({
        "first_name": "Jane",
        "family_name": "Austen",
        "date_of_birth": "1775-12-16",
        "date_of_death": "1817-07-18",
    })
}

fn emma(author: &str, genre: Value) -> Value {
    json!({
        "title": "Emma",
        "author": author,
        "summary": "Emma Woodhouse meddles in the love lives of her friends.",
        "isbn": "978-0-14-143958-7",
        "genre": genre,
    })
}

fn copy_of(book: &str, status: &str) -> Value {
    json!({
        "book": book,
        "imprint": "Penguin Classics, 2003",
        "status": status,
        "due_back": "",
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let response = get(&app, "/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");

    let response = get(&app, "/api/v1/ready").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_create_author() {
    let app = app();
    let response = post(&app, "/api/v1/catalog/authors", jane_austen()).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.body["id"].as_str().unwrap();
    assert_eq!(
        response.headers[LOCATION].to_str().unwrap(),
        format!("/api/v1/catalog/authors/{}", id)
    );
    assert_eq!(response.body["name"], "Austen, Jane");
    assert_eq!(response.body["lifespan"], "1775\u{2013}1817");
    assert_eq!(response.body["date_of_birth_iso"], "1775-12-16");
    assert_eq!(response.body["date_of_death_iso"], "1817-07-18");
    assert_eq!(response.body["url"], format!("/catalog/author/{}", id));
}

#[tokio::test]
async fn test_duplicate_author_returns_existing() {
    let app = app();
    let id = create(&app, "authors", jane_austen()).await;

    let response = post(&app, "/api/v1/catalog/authors", jane_austen()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], id.as_str());

    let list = get(&app, "/api/v1/catalog/authors").await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_author_is_rejected() {
    let app = app();
    let response = post(
        &app,
        "/api/v1/catalog/authors",
        json!({ "first_name": "", "family_name": "Austen!" }),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], 18);
    assert_eq!(response.body["error"], "BadValue");
}

#[tokio::test]
async fn test_author_list_sorted_by_family_name() {
    let app = app();
    for (first, family) in [("Virginia", "Woolf"), ("Jane", "Austen"), ("George", "Eliot")] {
        create(&app, "authors", json!({ "first_name": first, "family_name": family })).await;
    }

    let response = get(&app, "/api/v1/catalog/authors").await;
    let names: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["family_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Austen", "Eliot", "Woolf"]);
}

#[tokio::test]
async fn test_austen_emma_delete_flow() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    let book = create(&app, "books", emma(&jane, json!([]))).await;
    let author_uri = format!("/api/v1/catalog/authors/{}", jane);

    let confirm = get(&app, &format!("{}/delete", author_uri)).await;
    assert_eq!(confirm.status, StatusCode::OK);
    assert_eq!(confirm.body["allowed"], false);
    assert_eq!(confirm.body["blocking"][0]["title"], "Emma");

    let refused = delete(&app, &author_uri).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);
    assert_eq!(refused.body["error"], "HasDependents");
    assert_eq!(refused.body["blocking"].as_array().unwrap().len(), 1);
    assert_eq!(refused.body["blocking"][0]["id"], book.as_str());
    assert_eq!(get(&app, &author_uri).await.status, StatusCode::OK);

    let removed = delete(&app, &format!("/api/v1/catalog/books/{}", book)).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let confirm = get(&app, &format!("{}/delete", author_uri)).await;
    assert_eq!(confirm.body["allowed"], true);
    assert_eq!(delete(&app, &author_uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(get(&app, &author_uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_book_with_copies_cannot_be_deleted() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    let book = create(&app, "books", emma(&jane, json!([]))).await;
    let copy = create(&app, "bookinstances", copy_of(&book, "Available")).await;

    let refused = delete(&app, &format!("/api/v1/catalog/books/{}", book)).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);
    assert_eq!(refused.body["blocking"][0]["id"], copy.as_str());

    let removed = delete(&app, &format!("/api/v1/catalog/bookinstances/{}", copy)).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let removed = delete(&app, &format!("/api/v1/catalog/books/{}", book)).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_book_detail_resolves_author_genres_and_copies() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    let fiction = create(&app, "genres", json!({ "name": "Fiction" })).await;
    // a single genre id is accepted in place of a list
    let book = create(&app, "books", emma(&jane, json!(fiction))).await;
    create(&app, "bookinstances", copy_of(&book, "Loaned")).await;

    let detail = get(&app, &format!("/api/v1/catalog/books/{}", book)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["entity"]["isbn"], "9780141439587");
    assert_eq!(detail.body["entity"]["author"]["name"], "Austen, Jane");
    assert_eq!(detail.body["entity"]["genre"][0]["name"], "Fiction");
    assert_eq!(detail.body["dependents"][0]["status"], "Loaned");
    assert_eq!(detail.body["dependents"][0]["book"]["title"], "Emma");
}

#[tokio::test]
async fn test_genre_delete_is_unchecked_by_default() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    let fiction = create(&app, "genres", json!({ "name": "Fiction" })).await;
    let book = create(&app, "books", emma(&jane, json!([fiction]))).await;

    let removed = delete(&app, &format!("/api/v1/catalog/genres/{}", fiction)).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    // the dangling genre reference is skipped when the book is shown
    let detail = get(&app, &format!("/api/v1/catalog/books/{}", book)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["entity"]["genre"], json!([]));
}

#[tokio::test]
async fn test_restricted_genre_delete_is_blocked() {
    let app = app_with(IntegrityConfig {
        genre: DeletePolicy::Restrict,
    });
    let jane = create(&app, "authors", jane_austen()).await;
    let fiction = create(&app, "genres", json!({ "name": "Fiction" })).await;
    let poetry = create(&app, "genres", json!({ "name": "Poetry" })).await;
    create(&app, "books", emma(&jane, json!([fiction]))).await;

    let refused = delete(&app, &format!("/api/v1/catalog/genres/{}", fiction)).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);

    let removed = delete(&app, &format!("/api/v1/catalog/genres/{}", poetry)).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_book_validation() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;

    let mut bad_isbn = emma(&jane, json!([]));
    bad_isbn["isbn"] = json!("978-0-14-143958-8");
    let response = post(&app, "/api/v1/catalog/books", bad_isbn).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let unknown_author = emma(&Uuid::new_v4().to_string(), json!([]));
    let response = post(&app, "/api/v1/catalog/books", unknown_author).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let unknown_genre = emma(&jane, json!([Uuid::new_v4()]));
    let response = post(&app, "/api/v1/catalog/books", unknown_genre).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_keeps_id() {
    let app = app();
    let fiction = create(&app, "genres", json!({ "name": "Fiction" })).await;

    let uri = format!("/api/v1/catalog/genres/{}", fiction);
    let response = put(&app, &uri, json!({ "name": "Literary Fiction" })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], fiction.as_str());
    assert_eq!(response.body["name"], "Literary Fiction");

    let missing = format!("/api/v1/catalog/genres/{}", Uuid::new_v4());
    let response = put(&app, &missing, json!({ "name": "Poetry" })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_delete_confirmation_is_not_found() {
    let app = app();
    let uri = format!("/api/v1/catalog/authors/{}/delete", Uuid::new_v4());
    let response = get(&app, &uri).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NoSuchEntity");
}

#[tokio::test]
async fn test_catalog_summary() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    create(&app, "genres", json!({ "name": "Fiction" })).await;
    let book = create(&app, "books", emma(&jane, json!([]))).await;
    create(&app, "bookinstances", copy_of(&book, "Available")).await;
    create(&app, "bookinstances", copy_of(&book, "Maintenance")).await;

    let response = get(&app, "/api/v1/catalog").await;
    assert_eq!(
        response.body,
        json!({
            "book_count": 1,
            "book_instance_count": 2,
            "book_instance_available_count": 1,
            "author_count": 1,
            "genre_count": 1,
        })
    );
}

#[tokio::test]
async fn test_form_options() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    let fiction = create(&app, "genres", json!({ "name": "Fiction" })).await;
    create(&app, "genres", json!({ "name": "Poetry" })).await;
    let book = create(&app, "books", emma(&jane, json!([fiction]))).await;

    let form = get(&app, &format!("/api/v1/catalog/books/form?book_id={}", book)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(form.body["authors"][0]["id"], jane.as_str());
    assert_eq!(form.body["genres"][0]["name"], "Fiction");
    assert_eq!(form.body["genres"][0]["checked"], true);
    assert_eq!(form.body["genres"][1]["checked"], false);

    let form = get(&app, "/api/v1/catalog/bookinstances/form").await;
    assert_eq!(form.body["books"][0]["title"], "Emma");
    assert_eq!(
        form.body["statuses"],
        json!(["Available", "Maintenance", "Loaned", "Reserved"])
    );
}

#[tokio::test]
async fn test_book_instance_defaults_and_due_date() {
    let app = app();
    let jane = create(&app, "authors", jane_austen()).await;
    let book = create(&app, "books", emma(&jane, json!([]))).await;

    let response = post(
        &app,
        "/api/v1/catalog/bookinstances",
        json!({ "book": book, "imprint": "Penguin", "due_back": "2024-01-05" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "Maintenance");
    assert_eq!(response.body["due_back_formatted"], "Jan 5, 2024");
}
