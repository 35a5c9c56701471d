use cucumber::{given, then, when};
use serde_json::{Value, json};

use crate::QuillWorld;
use crate::steps::web_steps::{
    http_delete, http_get, http_patch, http_post, http_put, parse_last_response,
};

const DEFAULT_BODY: &str = "A perfectly serviceable article body.";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn post_id(world: &QuillWorld, alias: &str) -> i64 {
    *world
        .post_ids
        .get(alias)
        .unwrap_or_else(|| panic!("unknown post alias {alias:?}"))
}

pub fn section_id(world: &QuillWorld, alias: &str) -> i64 {
    *world
        .section_ids
        .get(alias)
        .unwrap_or_else(|| panic!("unknown section alias {alias:?}"))
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Create a post via the REST API, asserting 201, and store its id under
/// `alias` in the world.
async fn api_create_post(world: &mut QuillWorld, alias: &str, body: Value) {
    let (status, body_text) = http_post(world, "/posts", body).await;
    assert_eq!(
        status, 201,
        "expected 201 from POST /posts but got {status}: {body_text}"
    );
    let json: Value = serde_json::from_str(&body_text)
        .unwrap_or_else(|e| panic!("POST /posts response is not valid JSON: {e}\n{body_text}"));
    let id = json["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("POST /posts response has no 'id' field: {json}"));
    world.post_ids.insert(alias.to_string(), id);
}

/// Fetch a post's current JSON representation.
async fn fetch_post(world: &mut QuillWorld, alias: &str) -> Value {
    let id = post_id(world, alias);
    let (status, _) = http_get(world, &format!("/posts/{id}")).await;
    assert_eq!(status, 200, "GET /posts/{id} returned {status}");
    parse_last_response(world)
}

fn response_tag_names(post: &Value) -> Vec<String> {
    post["tags"]
        .as_array()
        .unwrap_or_else(|| panic!("post JSON has no 'tags' array: {post}"))
        .iter()
        .map(|t| t["name"].as_str().expect("tag has no name").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Given/When steps — creating posts
// ---------------------------------------------------------------------------

#[given(expr = "I created a post titled {string} in {string} with tags {string} as {string}")]
async fn i_created_a_post_with_tags(
    world: &mut QuillWorld,
    title: String,
    section: String,
    tags: String,
    alias: String,
) {
    let sid = section_id(world, &section);
    let body = json!({
        "title": title,
        "body": DEFAULT_BODY,
        "section_id": sid,
        "tags": split_tags(&tags),
    });
    api_create_post(world, &alias, body).await;
}

#[given(expr = "I created a post titled {string} in {string} as {string}")]
async fn i_created_a_post(world: &mut QuillWorld, title: String, section: String, alias: String) {
    let sid = section_id(world, &section);
    let body = json!({
        "title": title,
        "body": DEFAULT_BODY,
        "section_id": sid,
    });
    api_create_post(world, &alias, body).await;
}

/// Non-asserting create, for validation scenarios.
#[when(expr = "I try to create a post titled {string} in {string}")]
async fn i_try_to_create_a_post(world: &mut QuillWorld, title: String, section: String) {
    let sid = section_id(world, &section);
    let body = json!({ "title": title, "body": DEFAULT_BODY, "section_id": sid });
    http_post(world, "/posts", body).await;
}

#[when(expr = "I try to create a post titled {string} in {string} with tags {string}")]
async fn i_try_to_create_a_post_with_tags(
    world: &mut QuillWorld,
    title: String,
    section: String,
    tags: String,
) {
    let sid = section_id(world, &section);
    let body = json!({
        "title": title,
        "body": DEFAULT_BODY,
        "section_id": sid,
        "tags": split_tags(&tags),
    });
    http_post(world, "/posts", body).await;
}

#[when(expr = "I try to create a post titled {string} in section id {int}")]
async fn i_try_to_create_a_post_in_section_id(world: &mut QuillWorld, title: String, sid: i64) {
    let body = json!({ "title": title, "body": DEFAULT_BODY, "section_id": sid });
    http_post(world, "/posts", body).await;
}

// ---------------------------------------------------------------------------
// When steps — mutating posts
// ---------------------------------------------------------------------------

#[when(expr = "I PUT post {string} with title {string} and tags {string}")]
async fn i_put_post(world: &mut QuillWorld, alias: String, title: String, tags: String) {
    let current = fetch_post(world, &alias).await;
    let id = post_id(world, &alias);
    let body = json!({
        "title": title,
        "body": current["body"],
        "section_id": current["section"]["id"],
        "tags": split_tags(&tags),
    });
    http_put(world, &format!("/posts/{id}"), body).await;
}

#[when(expr = "I PATCH post {string} with tags {string}")]
async fn i_patch_post_tags(world: &mut QuillWorld, alias: String, tags: String) {
    let id = post_id(world, &alias);
    http_patch(world, &format!("/posts/{id}"), json!({ "tags": split_tags(&tags) })).await;
}

#[when(expr = "I PATCH post {string} clearing its tags")]
async fn i_patch_post_clearing_tags(world: &mut QuillWorld, alias: String) {
    let id = post_id(world, &alias);
    http_patch(world, &format!("/posts/{id}"), json!({ "tags": [] })).await;
}

#[when(expr = "I PATCH post {string} with title {string}")]
async fn i_patch_post_title(world: &mut QuillWorld, alias: String, title: String) {
    let id = post_id(world, &alias);
    http_patch(world, &format!("/posts/{id}"), json!({ "title": title })).await;
}

#[when(expr = "I PATCH post {string} with body {string}")]
async fn i_patch_post_body(world: &mut QuillWorld, alias: String, body: String) {
    let id = post_id(world, &alias);
    http_patch(world, &format!("/posts/{id}"), json!({ "body": body })).await;
}

#[when(expr = "I DELETE post {string}")]
async fn i_delete_post(world: &mut QuillWorld, alias: String) {
    let id = post_id(world, &alias);
    http_delete(world, &format!("/posts/{id}")).await;
}

#[when(expr = "I GET post {string}")]
async fn i_get_post(world: &mut QuillWorld, alias: String) {
    let id = post_id(world, &alias);
    http_get(world, &format!("/posts/{id}")).await;
}

// ---------------------------------------------------------------------------
// When steps — listing and filters
// ---------------------------------------------------------------------------

#[when(expr = "I list posts filtered by tags {string}")]
async fn i_list_posts_by_tags(world: &mut QuillWorld, tags: String) {
    http_get(world, &format!("/posts?tags={tags}")).await;
}

#[when(expr = "I list posts filtered by title {string}")]
async fn i_list_posts_by_title(world: &mut QuillWorld, title: String) {
    http_get(world, &format!("/posts?title={title}")).await;
}

#[when(expr = "I list posts filtered by section {string}")]
async fn i_list_posts_by_section(world: &mut QuillWorld, section: String) {
    let sid = section_id(world, &section);
    http_get(world, &format!("/posts?section_id={sid}")).await;
}

#[when(expr = "I list posts created after {string}")]
async fn i_list_posts_created_after(world: &mut QuillWorld, ts: String) {
    http_get(world, &format!("/posts?created_after={ts}")).await;
}

#[when(expr = "I list posts created before {string}")]
async fn i_list_posts_created_before(world: &mut QuillWorld, ts: String) {
    http_get(world, &format!("/posts?created_before={ts}")).await;
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then(expr = "the post {string} has tags {string}")]
async fn the_post_has_tags(world: &mut QuillWorld, alias: String, expected: String) {
    let post = fetch_post(world, &alias).await;
    let names = response_tag_names(&post);
    let expected: Vec<String> = split_tags(&expected);
    assert_eq!(names, expected, "post {alias:?} tags mismatch: {post}");
}

#[then(expr = "the post {string} has no tags")]
async fn the_post_has_no_tags(world: &mut QuillWorld, alias: String) {
    let post = fetch_post(world, &alias).await;
    let names = response_tag_names(&post);
    assert!(names.is_empty(), "post {alias:?} still has tags: {names:?}");
}

#[then(expr = "the listing has {int} posts")]
async fn the_listing_has_n_posts(world: &mut QuillWorld, expected: usize) {
    let json = parse_last_response(world);
    let posts = json
        .as_array()
        .unwrap_or_else(|| panic!("listing response is not an array: {json}"));
    assert_eq!(
        posts.len(),
        expected,
        "expected {expected} posts, got {}: {json}",
        posts.len()
    );
}

#[then(expr = "the listing titles are {string}")]
async fn the_listing_titles_are(world: &mut QuillWorld, expected: String) {
    let json = parse_last_response(world);
    let titles: Vec<String> = json
        .as_array()
        .unwrap_or_else(|| panic!("listing response is not an array: {json}"))
        .iter()
        .map(|p| p["title"].as_str().expect("post has no title").to_string())
        .collect();
    let expected: Vec<String> = expected.split(';').map(|s| s.trim().to_string()).collect();
    assert_eq!(titles, expected);
}

#[then(expr = "the response post has title {string}")]
async fn the_response_post_has_title(world: &mut QuillWorld, expected: String) {
    let post = parse_last_response(world);
    assert_eq!(post["title"].as_str(), Some(expected.as_str()), "{post}");
}

#[then(expr = "the response post has body {string}")]
async fn the_response_post_has_body(world: &mut QuillWorld, expected: String) {
    let post = parse_last_response(world);
    assert_eq!(post["body"].as_str(), Some(expected.as_str()), "{post}");
}

#[then(expr = "the response post is in section {string}")]
async fn the_response_post_is_in_section(world: &mut QuillWorld, expected: String) {
    let post = parse_last_response(world);
    assert_eq!(
        post["section"]["name"].as_str(),
        Some(expected.as_str()),
        "{post}"
    );
}

#[then("the response post has an updated timestamp")]
async fn the_response_post_has_updated(world: &mut QuillWorld) {
    let post = parse_last_response(world);
    assert!(
        post["updated_at"].is_string(),
        "updated_at not set: {post}"
    );
}

#[then("the response post has no updated timestamp")]
async fn the_response_post_has_no_updated(world: &mut QuillWorld) {
    let post = parse_last_response(world);
    assert!(
        post["updated_at"].is_null(),
        "updated_at unexpectedly set: {post}"
    );
}
