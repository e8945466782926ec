//! BDD step definitions for the response interception feature

use cucumber::{given, then, when};
use dtu_console::events::ConsoleEvent;
use dtu_console::interceptor::RequestOptions;
use dtu_console::io::HttpResponse;
use dtu_console::navigation::Route;
use dtu_console::ApiError;

use crate::world::ConsoleWorld;

#[given(expr = "the device answers {int} to {string}")]
fn device_answers(world: &mut ConsoleWorld, status: u16, path: String) {
    world.device.route(&path, HttpResponse::new(status, ""));
}

#[given(expr = "the device answers {int} with message {string} to {string}")]
fn device_answers_message(world: &mut ConsoleWorld, status: u16, message: String, path: String) {
    let body = serde_json::json!({"type": "danger", "message": message}).to_string();
    world.device.route(&path, HttpResponse::new(status, body));
}

#[given(expr = "the device answers {string} to {string}")]
fn device_answers_body(world: &mut ConsoleWorld, body: String, path: String) {
    world.device.route(&path, HttpResponse::new(200, body));
}

#[given(expr = "the device is unreachable at {string}")]
fn device_unreachable(world: &mut ConsoleWorld, path: String) {
    world.device.make_unreachable(&path);
}

#[given("I subscribe to console events")]
fn subscribe(world: &mut ConsoleWorld) {
    let receiver = world.console().events().subscribe();
    world.events = Some(receiver);
}

#[when(expr = "the view {string} requests {string}")]
async fn view_requests(world: &mut ConsoleWorld, origin: String, path: String) {
    let result = world
        .console()
        .api()
        .get(&path, &origin, RequestOptions::default())
        .await;
    world.api_result = Some(result);
}

#[when(expr = "the view {string} requests {string} ignoring errors")]
async fn view_requests_ignoring(world: &mut ConsoleWorld, origin: String, path: String) {
    let result = world
        .console()
        .api()
        .get(&path, &origin, RequestOptions::ignore_errors())
        .await;
    world.api_result = Some(result);
}

#[then(expr = "the call should return {string} as {string}")]
fn call_returns(world: &mut ConsoleWorld, field: String, value: String) {
    let result = world.api_result.as_ref().expect("no call made");
    let data = result.as_ref().unwrap().as_ref().expect("empty body");
    assert_eq!(data[field.as_str()], value.as_str());
}

#[then("the call should be rejected as unauthorized")]
fn rejected_unauthorized(world: &mut ConsoleWorld) {
    let result = world.api_result.as_ref().expect("no call made");
    assert_eq!(result, &Err(ApiError::Unauthorized));
}

#[then("the call should be rejected as a transport failure")]
fn rejected_transport(world: &mut ConsoleWorld) {
    let result = world.api_result.as_ref().expect("no call made");
    assert!(matches!(result, Err(ApiError::Transport(_))), "{result:?}");
}

#[then(expr = "the call should be rejected with status {int} and message {string}")]
fn rejected_server(world: &mut ConsoleWorld, status: u16, message: String) {
    let result = world.api_result.as_ref().expect("no call made");
    match result {
        Err(ApiError::Server(error)) => {
            assert_eq!(error.status, status);
            assert_eq!(error.message, message);
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[then(expr = "exactly {int} logged-out event(s) should have been published")]
fn logged_out_events(world: &mut ConsoleWorld, count: usize) {
    let receiver = world.events.as_mut().expect("not subscribed");
    let mut seen = 0;
    while let Ok(event) = receiver.try_recv() {
        if event == ConsoleEvent::LoggedOut {
            seen += 1;
        }
    }
    assert_eq!(seen, count);
}

#[then(expr = "the navigator should show the login view returning to {string}")]
fn navigated_to_login(world: &mut ConsoleWorld, return_url: String) {
    let routes = world.navigator.routes.lock().unwrap();
    assert_eq!(routes.last(), Some(&Route::Login { return_url }));
}

#[then(expr = "the navigator should have shown the login view {int} time(s)")]
fn login_view_count(world: &mut ConsoleWorld, count: usize) {
    let routes = world.navigator.routes.lock().unwrap();
    let shown = routes
        .iter()
        .filter(|r| matches!(r, Route::Login { .. }))
        .count();
    assert_eq!(shown, count);
}

#[then(expr = "the navigator should show the error view with status {int}")]
fn navigated_to_error(world: &mut ConsoleWorld, status: u16) {
    let routes = world.navigator.routes.lock().unwrap();
    match routes.last() {
        Some(Route::Error { status: shown, .. }) => assert_eq!(*shown, status),
        other => panic!("expected error view, got {other:?}"),
    }
}

#[then("the navigator should not have navigated")]
fn not_navigated(world: &mut ConsoleWorld) {
    assert!(world.navigator.routes.lock().unwrap().is_empty());
}
