mod common;

use cadence_common::{ActionKind, DisplayRectangle, InputSource, Point, Pointer, Timeout};
use cadence_engine::{ActionRunner, RunError, RunnerSettings};
use cadence_parser::{
    ActionBlock, ActionSpec, ClickAction, ScriptParser, ScrollAction, TextInputAction,
    WaitForElementAction,
};
use common::{Call, MockSurface, context, context_with};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

fn block(config: serde_json::Value) -> ActionBlock {
    let page = ScriptParser::new().parse_page(&config).unwrap();
    page.blocks()[0].clone()
}

#[tokio::test(start_paused = true)]
async fn test_get_navigates_then_waits_out_duration() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();

    let block = block(json!("https://example.com,5s"));
    runner.run_block(&mut ctx, &mut surface, &block).await.unwrap();

    assert_eq!(
        surface.calls,
        vec![
            Call::Navigate("https://example.com".into()),
            Call::Wait(Duration::from_secs(5))
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_get_subtracts_navigation_overhead() {
    let runner = ActionRunner::basic();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface {
        overhead: Duration::from_millis(300),
        ..MockSurface::default()
    };
    runner
        .run_block(&mut ctx, &mut surface, &block(json!("https://a.com,2s")))
        .await
        .unwrap();
    assert_eq!(surface.waits(), vec![Duration::from_millis(1700)]);

    let mut slow = MockSurface {
        overhead: Duration::from_secs(3),
        ..MockSurface::default()
    };
    runner
        .run_block(&mut ctx, &mut slow, &block(json!("https://a.com,2s")))
        .await
        .unwrap();
    assert!(slow.waits().is_empty());
    assert!(sink.warnings()[0].contains("took longer"));
}

#[tokio::test(start_paused = true)]
async fn test_get_ready_state_polls_until_reached() {
    let runner = ActionRunner::basic();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface::default();
    let block = block(json!([
        {"action": "get", "url": "https://a.com", "ready_state": "interactive", "timeout": "1s"}
    ]));
    runner.run_block(&mut ctx, &mut surface, &block).await.unwrap();
    assert_eq!(surface.evaluations(), vec!["ready_state"]);
    assert!(sink.warnings().is_empty());

    let mut loading = MockSurface {
        ready_state: "loading",
        ..MockSurface::default()
    };
    let started = Instant::now();
    runner.run_block(&mut ctx, &mut loading, &block).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(1));
    assert_eq!(loading.evaluations().len(), 6);
    assert!(sink.warnings()[0].contains("readyState 'interactive'"));
}

#[tokio::test(start_paused = true)]
async fn test_touch_click_on_basic_runner_is_not_implemented() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::with_elements(&["#btn"]);
    let action = ActionSpec::new(
        0,
        ClickAction::new(InputSource::Touch, Some("#btn".into()), None, false, false, Duration::ZERO)
            .unwrap(),
    );

    let err = runner.run_action(&mut ctx, &mut surface, &action).await.unwrap_err();
    match &err {
        RunError::NotImplemented {
            kind,
            input,
            runner,
            ..
        } => {
            assert_eq!(*kind, ActionKind::Click);
            assert_eq!(*input, Some(InputSource::Touch));
            assert_eq!(runner, "BasicActionRunner");
        }
        other => panic!("Expected NotImplemented, got {:?}", other),
    }
    assert!(err.to_string().contains("Source: 'touch'"));
    assert!(surface.calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_script_click_required_and_optional() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::with_elements(&["#present"]);

    let click = |selector: &str, required: bool| {
        ActionSpec::new(
            0,
            ClickAction::new(
                InputSource::Script,
                Some(selector.into()),
                None,
                required,
                false,
                Duration::ZERO,
            )
            .unwrap(),
        )
    };

    runner
        .run_action(&mut ctx, &mut surface, &click("#present", true))
        .await
        .unwrap();
    runner
        .run_action(&mut ctx, &mut surface, &click("#missing", false))
        .await
        .unwrap();
    let err = runner
        .run_action(&mut ctx, &mut surface, &click("#missing", true))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::ElementNotFound { ref selector } if selector == "#missing"));
    assert_eq!(surface.evaluations(), vec!["click", "click", "click"]);
}

#[tokio::test(start_paused = true)]
async fn test_click_with_duration_is_not_implemented() {
    let runner = ActionRunner::input();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();
    let action = ActionSpec::new(
        0,
        ClickAction::new(InputSource::Mouse, None, Some((5, 5)), false, false, Duration::from_secs(1))
            .unwrap(),
    );
    let err = runner.run_action(&mut ctx, &mut surface, &action).await.unwrap_err();
    assert!(matches!(err, RunError::NotImplemented { .. }));
    assert!(err.to_string().contains("InputActionRunner"));
}

#[tokio::test(start_paused = true)]
async fn test_script_scroll_ends_exactly_on_target() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface {
        scroll_offset: 100.0,
        overhead: Duration::from_millis(7),
        ..MockSurface::default()
    };
    let action = ActionSpec::new(
        0,
        ScrollAction::new(InputSource::Script, 500.0, Duration::from_secs(1), None, false).unwrap(),
    );

    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();

    assert_eq!(surface.scroll_offset, 600.0);
    let evaluations = surface.evaluations();
    assert_eq!(evaluations[0], "read_scroll");
    assert_eq!(*evaluations.last().unwrap(), "scroll_to(600)");
    assert!(evaluations.len() > 3);
    assert!(surface.waits().iter().all(|w| *w == Duration::from_millis(200)));
}

#[tokio::test(start_paused = true)]
async fn test_script_scroll_missing_element() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();
    let scroll = |required: bool| {
        ActionSpec::new(
            0,
            ScrollAction::new(
                InputSource::Script,
                200.0,
                Duration::from_secs(1),
                Some("#list".into()),
                required,
            )
            .unwrap(),
        )
    };

    runner.run_action(&mut ctx, &mut surface, &scroll(false)).await.unwrap();
    assert_eq!(surface.evaluations(), vec!["read_scroll"]);

    let err = runner
        .run_action(&mut ctx, &mut surface, &scroll(true))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::ElementNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_keyboard_text_input_meets_target_duration() {
    let runner = ActionRunner::input();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface {
        overhead: Duration::from_millis(3),
        ..MockSurface::default()
    };
    let action = ActionSpec::new(
        0,
        TextInputAction::new(InputSource::Keyboard, "hello world", Duration::from_secs(2)).unwrap(),
    );

    let started = Instant::now();
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(surface.typed, "hello world");
    let keystrokes = surface
        .calls
        .iter()
        .filter(|call| matches!(call, Call::Keys(_)))
        .count();
    assert_eq!(keystrokes, 11);
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed <= Duration::from_millis(2100), "took {:?}", elapsed);
    assert!(sink.warnings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_text_input_overrun_warns() {
    let runner = ActionRunner::input();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface {
        overhead: Duration::from_millis(300),
        ..MockSurface::default()
    };
    let action = ActionSpec::new(
        0,
        TextInputAction::new(InputSource::Keyboard, "abcde", Duration::from_millis(500)).unwrap(),
    );
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    assert!(surface.waits().is_empty());
    assert!(sink.warnings()[0].contains("behind schedule"));
}

#[tokio::test(start_paused = true)]
async fn test_instant_text_input_types_everything_at_once() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();
    let action = ActionSpec::new(
        0,
        TextInputAction::new(InputSource::Script, "query", Duration::ZERO).unwrap(),
    );
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    assert_eq!(surface.evaluations(), vec!["type(query)"]);
}

#[tokio::test(start_paused = true)]
async fn test_keyboard_text_on_basic_runner_is_not_implemented() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();
    let action = ActionSpec::new(
        0,
        TextInputAction::new(InputSource::Keyboard, "abc", Duration::ZERO).unwrap(),
    );
    let err = runner.run_action(&mut ctx, &mut surface, &action).await.unwrap_err();
    assert!(err.is_not_implemented());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_element_times_out_softly() {
    let runner = ActionRunner::basic();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface::default();
    let action = ActionSpec::new(0, WaitForElementAction::new("#late").unwrap())
        .with_timeout(Timeout::Limited(Duration::from_secs(2)));

    let started = Instant::now();
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(sink.warnings(), vec!["Timed out waiting for '#late'".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_element_guard_stops_a_stuck_page() {
    let runner = ActionRunner::basic();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface {
        hang_wait_for_element: true,
        ..MockSurface::default()
    };
    let action = ActionSpec::new(0, WaitForElementAction::new("#never").unwrap())
        .with_timeout(Timeout::Limited(Duration::from_secs(2)));

    let started = Instant::now();
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    let grace = RunnerSettings::default().wait_for_element_grace;
    assert_eq!(started.elapsed(), Duration::from_secs(2) + grace);
    assert_eq!(sink.warnings().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_present_element() {
    let runner = ActionRunner::basic();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface::with_elements(&["main"]);
    let action = ActionSpec::new(0, WaitForElementAction::new("main").unwrap());
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    assert!(sink.warnings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_beyond_the_clock_range_do_not_overflow() {
    let runner = ActionRunner::basic();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface::with_elements(&["#ready"]);
    let block = block(json!([
        {"action": "get", "url": "https://example.com", "ready_state": "interactive", "timeout": "1e19s"},
        {"action": "wait_for_element", "selector": "#ready", "timeout": "1e19s"}
    ]));
    assert_eq!(
        block.actions()[0].timeout(),
        Timeout::Limited(Duration::from_secs(10_000_000_000_000_000_000))
    );

    runner.run_block(&mut ctx, &mut surface, &block).await.unwrap();

    assert_eq!(surface.evaluations(), vec!["ready_state", "wait_for_element"]);
    assert!(sink.warnings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_touch_scroll_is_split_into_swipes() {
    let runner = ActionRunner::input();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();
    let action = ActionSpec::new(
        0,
        ScrollAction::new(InputSource::Touch, 2000.0, Duration::from_secs(4), None, false).unwrap(),
    );

    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();

    let swipes = surface.swipes();
    assert_eq!(swipes.len(), 3);
    assert_eq!(swipes[0].0, Point::new(200.0, 800.0));
    assert_eq!(swipes[0].1, Point::new(200.0, 0.0));
    assert_eq!(swipes[2].1, Point::new(200.0, 400.0));
    let seconds: Vec<f64> = swipes.iter().map(|s| s.2.as_secs_f64()).collect();
    assert!((seconds[0] - 1.6).abs() < 1e-6);
    assert!((seconds[2] - 0.8).abs() < 1e-6);
    assert!((seconds.iter().sum::<f64>() - 4.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_touch_scroll_inside_element() {
    let runner = ActionRunner::input();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface {
        element_rect: DisplayRectangle::new(0.0, 100.0, 200.0, 300.0),
        ..MockSurface::with_elements(&["#feed"])
    };
    let action = ActionSpec::new(
        0,
        ScrollAction::new(
            InputSource::Mouse,
            -100.0,
            Duration::from_secs(1),
            Some("#feed".into()),
            true,
        )
        .unwrap(),
    );
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    let swipes = surface.swipes();
    assert_eq!(swipes.len(), 1);
    assert_eq!(swipes[0].0, Point::new(100.0, 100.0));
    assert_eq!(swipes[0].1, Point::new(100.0, 200.0));
}

#[tokio::test(start_paused = true)]
async fn test_pointer_scroll_without_window_bounds_is_not_implemented() {
    let runner = ActionRunner::input();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface {
        window: None,
        ..MockSurface::default()
    };
    let action = ActionSpec::new(
        0,
        ScrollAction::new(InputSource::Touch, 100.0, Duration::from_secs(1), None, false).unwrap(),
    );
    let err = runner.run_action(&mut ctx, &mut surface, &action).await.unwrap_err();
    assert!(matches!(err, RunError::NotImplemented { .. }));
    assert!(err.to_string().contains("Surface 'mock' does not support window_bounds"));
}

#[tokio::test(start_paused = true)]
async fn test_touch_click_taps_element_center() {
    let runner = ActionRunner::input();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface {
        element_rect: DisplayRectangle::new(10.0, 20.0, 100.0, 50.0),
        ..MockSurface::with_elements(&["#btn"])
    };
    let action = ActionSpec::new(
        0,
        ClickAction::new(InputSource::Touch, Some("#btn".into()), None, true, true, Duration::ZERO)
            .unwrap(),
    );
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    assert_eq!(
        surface.calls.last(),
        Some(&Call::Tap(Point::new(60.0, 45.0), Pointer::Touch))
    );
}

#[tokio::test(start_paused = true)]
async fn test_swipe_and_screenshot_actions() {
    let runner = ActionRunner::input();
    let (mut ctx, sink) = context(&runner);
    let mut surface = MockSurface::default();
    let block = block(json!([
        {"action": "get", "url": "https://a.com"},
        {"action": "swipe", "start_x": 10, "start_y": 500, "end_x": 10, "end_y": 100, "duration": "500ms"},
        {"action": "screenshot"},
        {"action": "inject_new_document_script", "script": "window.injected = true;"},
        {"action": "js", "script": "window.x = 1;"}
    ]));
    runner.run_block(&mut ctx, &mut surface, &block).await.unwrap();

    assert_eq!(
        surface.swipes(),
        vec![(
            Point::new(10.0, 500.0),
            Point::new(10.0, 100.0),
            Duration::from_millis(500)
        )]
    );
    assert_eq!(
        sink.screenshots(),
        vec![("block_0_action_3_screenshot.png".to_string(), 4)]
    );
    assert!(surface.calls.contains(&Call::Inject("window.injected = true;".into())));
    assert_eq!(surface.evaluations(), vec!["js: window.x = 1;"]);
}

#[tokio::test(start_paused = true)]
async fn test_script_errors_propagate_unchanged() {
    let runner = ActionRunner::basic();
    let (mut ctx, _sink) = context(&runner);
    let mut surface = MockSurface::default();
    let block = block(json!([
        {"action": "get", "url": "https://a.com"},
        {"action": "js", "script": "throw new Error('boom')"}
    ]));
    let err = runner.run_block(&mut ctx, &mut surface, &block).await.unwrap_err();
    assert!(matches!(err, RunError::Surface(cadence_engine::SurfaceError::Script(_))));
    assert_eq!(ctx.tag().map(|tag| tag.action), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_scroll_interval_comes_from_settings() {
    let runner = ActionRunner::basic();
    let settings = RunnerSettings {
        scroll_step_interval: Duration::from_millis(500),
        ..RunnerSettings::default()
    };
    let (mut ctx, _sink) = context_with(&runner, settings);
    let mut surface = MockSurface::default();
    let action = ActionSpec::new(
        0,
        ScrollAction::new(InputSource::Script, 300.0, Duration::from_secs(1), None, false).unwrap(),
    );
    runner.run_action(&mut ctx, &mut surface, &action).await.unwrap();
    assert_eq!(
        surface.waits(),
        vec![Duration::from_millis(500), Duration::from_millis(500)]
    );
    assert_eq!(surface.scroll_offset, 300.0);
}
