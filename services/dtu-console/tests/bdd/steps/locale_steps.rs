//! BDD step definitions for the locale management feature

use cucumber::{given, then, when};
use dtu_console::io::HttpResponse;
use dtu_console::locale::LocaleDescriptor;

use crate::world::ConsoleWorld;

const LANGUAGES: &str = "/api/i18n/languages";

fn catalog_path(code: &str) -> String {
    format!("/api/i18n/language?code={}", code)
}

#[given("the device lists no extra languages")]
fn no_extra_languages(world: &mut ConsoleWorld) {
    world.languages.clear();
    world.device.route(LANGUAGES, HttpResponse::new(200, "[]"));
}

#[given(expr = "the device lists the language {string} named {string}")]
fn lists_language(world: &mut ConsoleWorld, code: String, name: String) {
    world.languages.push(LocaleDescriptor { code, name });
    let body = serde_json::to_string(&world.languages).unwrap();
    world.device.route(LANGUAGES, HttpResponse::new(200, body));
}

#[given(expr = "the device serves the {string} catalog with title {string}")]
fn serves_catalog(world: &mut ConsoleWorld, code: String, title: String) {
    let body = serde_json::json!({"webapp": {"login": {"title": title}}}).to_string();
    world
        .device
        .route(&catalog_path(&code), HttpResponse::new(200, body));
}

#[given(expr = "the {string} catalog becomes unreachable")]
fn catalog_unreachable(world: &mut ConsoleWorld, code: String) {
    world.device.make_unreachable(&catalog_path(&code));
}

#[given(expr = "the persisted locale is {string}")]
fn persisted_locale(world: &mut ConsoleWorld, code: String) {
    world.console().store().set_locale_preference(&code);
}

async fn initialize(world: &mut ConsoleWorld) {
    let active = world.console().locale_mut().initialize().await;
    world.locale_result = Some(active);
}

#[given("the console has started")]
async fn console_started(world: &mut ConsoleWorld) {
    initialize(world).await;
}

#[when("the console starts")]
async fn console_starts(world: &mut ConsoleWorld) {
    initialize(world).await;
}

#[when("the console is reloaded")]
async fn console_reloads(world: &mut ConsoleWorld) {
    world.reload();
    initialize(world).await;
}

#[when(expr = "I switch the locale to {string}")]
async fn switch_locale(world: &mut ConsoleWorld, code: String) {
    let active = world.console().locale_mut().set_locale(&code).await;
    world.locale_result = Some(active);
}

#[then(expr = "the known locales should be {string}")]
fn known_locales(world: &mut ConsoleWorld, expected: String) {
    let codes: Vec<String> = world
        .console()
        .locale()
        .known_locales()
        .iter()
        .map(|l| l.code.clone())
        .collect();
    assert_eq!(codes.join(", "), expected);
}

#[then(expr = "the active locale should be {string}")]
fn active_locale(world: &mut ConsoleWorld, expected: String) {
    assert_eq!(world.console().locale().active_locale(), expected);
    assert_eq!(world.locale_result.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the persisted locale should be {string}")]
fn persisted_is(world: &mut ConsoleWorld, expected: String) {
    assert_eq!(
        world.console().store().locale_preference().as_deref(),
        Some(expected.as_str())
    );
}

#[then(expr = "{string} should translate to {string}")]
fn translates(world: &mut ConsoleWorld, key: String, expected: String) {
    assert_eq!(world.console().locale().translate(&key), expected);
}

#[then(expr = "the {string} catalog should have been fetched {int} time(s)")]
fn catalog_fetch_count(world: &mut ConsoleWorld, code: String, count: usize) {
    assert_eq!(world.device.request_count(&catalog_path(&code)), count);
}
