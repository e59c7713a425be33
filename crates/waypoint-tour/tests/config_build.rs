//! Building tours from TOML and JSON definitions on disk.

use std::fs;

use waypoint_core::{Document, ElementSpec, Rect};
use waypoint_harness::HeadlessHost;
use waypoint_tour::{ConfigError, Registry, TourConfig, TourState};

const TOUR_TOML: &str = r##"
tour_name = "onboarding"
use_modal_overlay = true
confirm_cancel = true
confirm_cancel_message = "Leave the tour?"

[tooltip_defaults]
duration = 0

[default_step_options]
show_cancel_link = true
modal_overlay_opening_padding = 1
buttons = [{ text = "Next", action = "next" }]

[[steps]]
id = "hero"
title = "The hero"
text = "This is the hero section."
attach_to = { element = ".hero", on = "bottom" }

[[steps]]
id = "save"
text = "Press save to continue."
attach_to = { element = "#save", on = "left" }
advance_on = { selector = "#save", event = "click" }
buttons = []

[[steps]]
id = "done"
text = ["All set.", "Enjoy."]
buttons = [
    { text = "Restart", action = { show = "hero" } },
    { text = "Finish", action = "complete", events = { dblclick = "cancel" } },
]
"##;

fn page() -> HeadlessHost {
    let host = HeadlessHost::new(Rect::from_size(80, 24));
    let body = host.document.body();
    host.document.insert(
        body,
        &ElementSpec::new("section").class("hero"),
        Rect::new(2, 2, 40, 6),
    );
    host.document.insert(
        body,
        &ElementSpec::new("button").attr("id", "save").text("Save"),
        Rect::new(60, 20, 8, 1),
    );
    host
}

fn button(host: &HeadlessHost, step: &str, text: &str) -> waypoint_core::ElementId {
    host.document
        .query_selector_all(&format!("[data-waypoint-step-id={step}] .waypoint-button"))
        .into_iter()
        .find(|element| host.document.text(*element).as_deref() == Some(text))
        .unwrap_or_else(|| panic!("no {text:?} button on step {step}"))
}

#[test]
fn toml_file_builds_a_working_tour() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("onboarding.toml");
    fs::write(&path, TOUR_TOML).expect("write");

    let config = TourConfig::from_toml_file(&path).expect("load");
    let host = page();
    let tour = config
        .build(host.host(), Registry::new())
        .expect("build");

    assert!(tour.id().starts_with("onboarding--"));
    assert_eq!(tour.step_count(), 3);
    assert_eq!(host.tooltips.default_prop("duration"), Some(serde_json::json!(0)));

    tour.start();
    assert_eq!(host.overlay.opening(), Some(Rect::new(1, 1, 42, 8)));

    host.document.click(button(&host, "hero", "Next"));
    let save_step = tour.current_step().expect("current");
    assert_eq!(save_step.id().as_str(), "save");
    assert!(
        host.document
            .query_selector_all("[data-waypoint-step-id=save] .waypoint-button")
            .is_empty(),
        "an empty button list overrides the default"
    );

    let save = host.document.query_selector("#save").expect("save button");
    host.document.click(save);
    assert_eq!(
        tour.current_step().map(|step| step.id().to_string()).as_deref(),
        Some("done")
    );

    host.document.click(button(&host, "done", "Restart"));
    assert_eq!(
        tour.current_step().map(|step| step.id().to_string()).as_deref(),
        Some("hero")
    );

    tour.show("done");
    host.document.click(button(&host, "done", "Finish"));
    assert_eq!(tour.state(), TourState::Completed);
    assert!(host.residue().is_empty(), "{:?}", host.residue());
}

#[test]
fn cancel_prompt_comes_from_the_definition() {
    let config = TourConfig::from_toml_str(TOUR_TOML).expect("parse");
    let host = page();
    let tour = config.build(host.host(), Registry::new()).expect("build");
    tour.start();

    let link = host.document.query_selector_all(".waypoint-cancel-link")[0];
    host.document.queue_confirm(false);
    host.document.click(link);
    assert_eq!(tour.state(), TourState::Active);
    assert_eq!(host.document.prompts(), vec!["Leave the tour?"]);
}

#[test]
fn button_extra_events_come_from_the_definition() {
    let config = TourConfig::from_toml_str(TOUR_TOML).expect("parse");
    let host = page();
    let tour = config.build(host.host(), Registry::new()).expect("build");
    tour.show("done");

    host.document
        .dispatch(button(&host, "done", "Finish"), "dblclick", None);
    assert_eq!(tour.state(), TourState::Cancelled);
}

#[test]
fn json_file_is_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tour.json");
    fs::write(
        &path,
        r#"{
            "tour_name": "json",
            "keyboard_navigation": false,
            "steps": [
                { "id": "one", "text": "First" },
                { "id": "two", "scroll_to": "smooth", "attach_to": { "element": ".hero" } }
            ]
        }"#,
    )
    .expect("write");

    let config = TourConfig::from_json_file(&path).expect("load");
    let host = page();
    let tour = config.build(host.host(), Registry::new()).expect("build");
    tour.start();
    host.document.press_key("ArrowRight");
    assert_eq!(
        tour.current_step().map(|step| step.id().to_string()).as_deref(),
        Some("one")
    );

    tour.next();
    assert_eq!(host.document.scrolls().len(), 1);
    assert_eq!(host.tooltips.current().and_then(|r| r.placement), None);
}

#[test]
fn invalid_definitions_are_refused() {
    let config = TourConfig::from_toml_str(
        r#"
[[steps]]
id = "a"
buttons = [{ text = "Go", action = { show = "nowhere" } }]

[[steps]]
id = "a"
"#,
    )
    .expect("parse");

    let host = page();
    let err = config
        .build(host.host(), Registry::new())
        .expect_err("invalid");
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 2, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("used more than once")));
            assert!(errors.iter().any(|e| e.contains("\"nowhere\"")));
        }
        other => panic!("expected validation errors, got {other}"),
    }
}

#[test]
fn missing_files_surface_io_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = TourConfig::from_toml_file(dir.path().join("absent.toml")).expect_err("missing");
    assert!(matches!(err, ConfigError::Io(_)));
}
