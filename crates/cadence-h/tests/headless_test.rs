use cadence_common::WindowTarget;
use cadence_engine::{ActionRunner, RecordingSink, RunnerSettings, StoryRunner, Surface};
use cadence_h::HeadlessSurface;
use cadence_parser::ScriptParser;
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;

async fn launch() -> Option<HeadlessSurface> {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();

    let mut surface = HeadlessSurface::default();
    match surface.launch().await {
        Ok(()) => Some(surface),
        Err(e) => {
            eprintln!("Failed to launch browser (is Chromium installed?): {}", e);
            None
        }
    }
}

const PAGE: &str = "data:text/html,<html><body style='height:4000px'>\
<button id='btn' onclick='document.title=\"clicked\"'>Click</button>\
<input id='field'></body></html>";

#[tokio::test]
#[serial]
async fn test_evaluate_binds_arguments_and_awaits_promises() {
    let Some(mut surface) = launch().await else {
        return;
    };
    surface.navigate(PAGE, WindowTarget::SelfTarget).await.unwrap();

    let sum = surface
        .evaluate("return arguments[0] + arguments[1];", vec![json!(2), json!(3)])
        .await
        .unwrap();
    assert_eq!(sum, json!(5));

    let later = surface
        .evaluate(
            "return new Promise((resolve) => setTimeout(() => resolve('done'), 10));",
            Vec::new(),
        )
        .await
        .unwrap();
    assert_eq!(later, json!("done"));

    assert!(surface.evaluate("throw new Error('boom');", Vec::new()).await.is_err());

    let bounds = surface.window_bounds().await.unwrap();
    assert!(bounds.width > 0.0 && bounds.height > 0.0);

    let png = surface.capture().await.unwrap();
    assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);

    surface.close().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_script_story_on_chromium() {
    let Some(mut surface) = launch().await else {
        return;
    };
    let page = ScriptParser::new()
        .parse_page(&json!({
            "label": "smoke",
            "blocks": [
                {"action": "get", "url": PAGE, "ready_state": "complete"},
                {"action": "click", "selector": "#btn", "required": true},
                {"action": "scroll", "distance": 500, "duration": "200ms"},
                {"action": "wait_for_element", "selector": "#field", "timeout": "1s"}
            ]
        }))
        .unwrap();

    let sink = Arc::new(RecordingSink::new());
    let story = StoryRunner::new(ActionRunner::basic(), RunnerSettings::default(), sink);
    let report = story.run_page(&mut surface, &page).await.unwrap();
    assert_eq!(report.actions, 4);

    let title = surface.evaluate("return document.title;", Vec::new()).await.unwrap();
    assert_eq!(title, json!("clicked"));
    let offset = surface.evaluate("return window.scrollY;", Vec::new()).await.unwrap();
    assert_eq!(offset.as_f64(), Some(500.0));

    surface.close().await.unwrap();
}
