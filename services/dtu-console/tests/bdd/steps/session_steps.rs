//! BDD step definitions for the session lifecycle feature

use cucumber::{given, then, when};
use dtu_console::auth::{basic_token, build_auth_headers, REQUESTED_WITH};
use dtu_console::ConsoleError;
use reqwest::header::AUTHORIZATION;

use crate::world::ConsoleWorld;

#[given(expr = "a device accepting user {string} with password {string}")]
fn device_accepts(world: &mut ConsoleWorld, username: String, password: String) {
    world.device.accept(&username, &password);
}

#[given(expr = "I am logged in as {string} with password {string}")]
async fn logged_in(world: &mut ConsoleWorld, username: String, password: String) {
    world
        .console()
        .login()
        .login(&username, &password)
        .await
        .expect("login should succeed");
}

#[when(expr = "I log in as {string} with password {string}")]
async fn log_in(world: &mut ConsoleWorld, username: String, password: String) {
    let result = world.console().login().login(&username, &password).await;
    world.login_result = Some(result);
}

#[when("I log out")]
fn log_out(world: &mut ConsoleWorld) {
    world.console().login().logout();
}

#[then("the login should succeed")]
fn login_succeeds(world: &mut ConsoleWorld) {
    let result = world.login_result.as_ref().expect("no login attempted");
    result.as_ref().unwrap();
}

#[then("the login should fail with invalid credentials")]
fn login_invalid(world: &mut ConsoleWorld) {
    let result = world.login_result.as_ref().expect("no login attempted");
    assert!(
        matches!(result, Err(ConsoleError::InvalidCredentials)),
        "{result:?}"
    );
}

#[then("I should be logged in")]
fn is_logged_in(world: &mut ConsoleWorld) {
    assert!(world.console().login().is_logged_in());
}

#[then("I should not be logged in")]
fn is_logged_out(world: &mut ConsoleWorld) {
    assert!(!world.console().login().is_logged_in());
    assert!(world.console().store().get().is_none());
}

#[then(expr = "the stored token should be the Basic token of {string} and {string}")]
fn stored_token(world: &mut ConsoleWorld, username: String, password: String) {
    let session = world.console().store().get().expect("no session stored");
    assert_eq!(session.auth_data, basic_token(&username, &password));
}

#[then("the request headers should not contain an Authorization header")]
fn no_authorization(world: &mut ConsoleWorld) {
    let headers = build_auth_headers(world.console().store());
    assert!(headers.get(AUTHORIZATION).is_none());
}

#[then(expr = "the request headers should contain the Basic token of {string} and {string}")]
fn has_authorization(world: &mut ConsoleWorld, username: String, password: String) {
    let headers = build_auth_headers(world.console().store());
    let values: Vec<_> = headers.get_all(AUTHORIZATION).iter().collect();
    assert_eq!(values.len(), 1);
    assert_eq!(
        values[0].to_str().unwrap(),
        format!("Basic {}", basic_token(&username, &password))
    );
}

#[then("the request headers should mark the call as an API call")]
fn marks_api_call(world: &mut ConsoleWorld) {
    let headers = build_auth_headers(world.console().store());
    assert_eq!(
        headers.get(REQUESTED_WITH).and_then(|v| v.to_str().ok()),
        Some("XMLHttpRequest")
    );
}

#[then(expr = "the live-data URL should be {string}")]
fn live_data_url(world: &mut ConsoleWorld, expected: String) {
    assert_eq!(world.console().live_data_url().unwrap(), expected);
}
