use cadence_common::{ActionKind, InputSource, ReadyState, Timeout};
use cadence_parser::{ActionBody, ScriptParser, ScriptResolver};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

struct MemoryResolver {
    files: HashMap<String, String>,
}

impl ScriptResolver for MemoryResolver {
    fn read_script(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(path.to_string_lossy().as_ref())
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such script"))
    }
}

fn parser_with_files(files: &[(&str, &str)]) -> ScriptParser {
    let files = files
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ScriptParser::with_resolver(Arc::new(MemoryResolver { files }))
}

#[test]
fn test_url_with_duration_string() {
    let page = ScriptParser::new()
        .parse_page(&json!("https://example.com,5s"))
        .unwrap();
    assert_eq!(page.blocks().len(), 1);
    let actions = page.blocks()[0].actions();
    assert_eq!(actions.len(), 1);
    match actions[0].body() {
        ActionBody::Get(get) => {
            assert_eq!(get.url(), "https://example.com");
            assert_eq!(get.duration(), Duration::from_secs(5));
            assert_eq!(get.ready_state(), ReadyState::Any);
        }
        other => panic!("Expected get, got {:?}", other),
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let config = json!([
        {"label": "open", "actions": [{"action": "get", "url": "example.com"}]},
        {"label": "browse", "actions": [
            {"action": "scroll", "distance": -300, "duration": "2s"},
            {"action": "click", "selector": "#more", "required": true},
            {"action": "text_input", "source": "keyboard", "text": "hello", "duration": 1}
        ]}
    ]);
    let parser = ScriptParser::new();
    let first = parser.parse_page(&config).unwrap();
    let second = parser.parse_page(&config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bare_actions_become_default_block() {
    let page = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "wait", "duration": "2s"}
        ]))
        .unwrap();
    assert_eq!(page.blocks().len(), 1);
    assert_eq!(page.blocks()[0].label(), "default");
    assert_eq!(page.blocks()[0].actions()[1].kind(), ActionKind::Wait);
    assert_eq!(page.blocks()[0].actions()[1].index(), 1);
}

#[test]
fn test_bare_url_list_is_one_block_of_gets() {
    let page = ScriptParser::new()
        .parse_page(&json!(["url1.com,5s", "url2.com"]))
        .unwrap();
    let actions = page.blocks()[0].actions();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].duration(), Duration::from_secs(5));
    assert_eq!(actions[1].duration(), Duration::ZERO);
}

#[test]
fn test_blocks_indexed_by_position() {
    let page = ScriptParser::new()
        .parse_page(&json!([
            {"label": "b1", "actions": [{"action": "get", "url": "https://a.com"}]},
            {"label": "b2", "actions": [{"action": "wait", "duration": 1}]}
        ]))
        .unwrap();
    for (position, block) in page.blocks().iter().enumerate() {
        assert_eq!(block.index(), position);
    }
    assert_eq!(page.blocks()[1].label(), "b2");
}

#[test]
fn test_unrecognized_first_element_is_rejected() {
    let err = ScriptParser::new()
        .parse_page(&json!([{"selector": "#x"}]))
        .unwrap_err();
    assert_eq!(
        err.message(),
        "Invalid data: Expected a list of either blocks or actions."
    );
}

#[test]
fn test_error_path_points_into_blocks() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"label": "b0", "actions": [{"action": "get", "url": "https://a.com"}]},
            {"label": "b1", "actions": [
                {"action": "wait", "duration": 1},
                {"action": "wait", "duration": 2},
                {"action": "wait", "duration": "soon"}
            ]}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "blocks[1].actions[2].duration");
}

#[test]
fn test_bare_action_error_path() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "click", "selector": "#a", "x": 1, "y": 2}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[1]");
    assert!(err.message().contains("Only one of"));
}

#[test]
fn test_unknown_keys_are_errors() {
    let err = ScriptParser::new()
        .parse_page(&json!([{"action": "get", "url": "https://a.com", "speed": 3}]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[0].speed");
}

#[test]
fn test_missing_get_is_config_error() {
    let err = ScriptParser::new()
        .parse_page(&json!([{"action": "wait", "duration": 1}]))
        .unwrap_err();
    assert!(err.message().contains("at least one get"));
}

#[test]
fn test_scroll_required_without_selector() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "scroll", "required": true}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[1].required");
}

#[test]
fn test_click_script_with_coordinates() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "click", "source": "js", "x": 1, "y": 2}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[1].source");
}

#[test]
fn test_click_needs_both_coordinates() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "click", "source": "touch", "x": 1}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[1].y");
}

#[test]
fn test_reserved_login_label() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"label": "login", "actions": [{"action": "get", "url": "https://a.com"}]}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "blocks[0].label");
}

#[test]
fn test_blocks_mapping_and_label_conflict() {
    let parser = ScriptParser::new();
    let page = parser
        .parse_page(&json!({
            "blocks": {
                "open": [{"action": "get", "url": "https://a.com"}],
                "read": {"actions": [{"action": "wait", "duration": 1}]}
            }
        }))
        .unwrap();
    let labels: Vec<&str> = page.blocks().iter().map(|b| b.label()).collect();
    assert_eq!(labels, ["open", "read"]);

    let err = parser
        .parse_page(&json!({
            "blocks": {
                "open": {"label": "other", "actions": [{"action": "get", "url": "https://a.com"}]}
            }
        }))
        .unwrap_err();
    assert_eq!(err.path(), "blocks.open.label");
}

#[test]
fn test_page_dict_with_login_and_playback() {
    let page = ScriptParser::new()
        .parse_page(&json!({
            "label": "shop",
            "playback": "3x",
            "login": [{"action": "get", "url": "https://a.com/login"}],
            "actions": [{"action": "get", "url": "https://a.com"}]
        }))
        .unwrap();
    assert_eq!(page.label(), "shop");
    assert_eq!(page.playback().count(), 3);
    let login = page.login().unwrap();
    assert!(login.is_login());
    assert_eq!(login.label(), "login");
}

#[test]
fn test_aliases_and_defaults() {
    let page = ScriptParser::new()
        .parse_page(&json!([
            {"type": "get", "url": "a.com", "ready_state": "complete", "timeout": "inf"},
            {"action": "swipe", "startx": 1, "starty": 2, "end_x": 3, "endy": 4},
            {"action": "scroll", "source": "touch"}
        ]))
        .unwrap();
    let actions = page.blocks()[0].actions();
    assert_eq!(actions[0].timeout(), Timeout::Unlimited);
    match actions[0].body() {
        ActionBody::Get(get) => assert_eq!(get.url(), "https://a.com"),
        other => panic!("Expected get, got {:?}", other),
    }
    assert_eq!(actions[1].duration(), Duration::from_secs(1));
    match actions[2].body() {
        ActionBody::Scroll(scroll) => {
            assert_eq!(scroll.distance(), 500.0);
            assert_eq!(scroll.source(), InputSource::Touch);
            assert_eq!(scroll.duration(), Duration::from_secs(1));
        }
        other => panic!("Expected scroll, got {:?}", other),
    }
    assert_eq!(actions[2].timeout(), Timeout::Limited(Duration::from_secs(20)));
}

#[test]
fn test_null_timeout_means_unlimited() {
    let page = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com", "timeout": null},
            {"action": "wait_for_element", "selector": "#x"}
        ]))
        .unwrap();
    let actions = page.blocks()[0].actions();
    assert_eq!(actions[0].timeout(), Timeout::Unlimited);
    assert_eq!(actions[1].timeout(), Timeout::DEFAULT);

    let pages = cadence_parser::parse_config_str(
        "- action: get\n  url: https://a.com\n  timeout: ~\n",
    )
    .unwrap();
    let get = &pages.pages()[0].blocks()[0].actions()[0];
    assert_eq!(get.timeout(), Timeout::Unlimited);
}

#[test]
fn test_explicit_action_index_must_match() {
    let err = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com", "index": 0},
            {"action": "wait", "duration": 1, "index": 3}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[1].index");
}

#[test]
fn test_script_path_is_resolved_and_replaced() {
    let parser = parser_with_files(&[("scripts/hello.js", "console.log('$WHO');")]);
    let page = parser
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "js", "path": "scripts/hello.js", "replace": {"$WHO": "world"}}
        ]))
        .unwrap();
    match page.blocks()[0].actions()[1].body() {
        ActionBody::RunScript(script) => {
            assert_eq!(script.script(), "console.log('world');");
            assert_eq!(
                script.script_path(),
                Some(Path::new("scripts/hello.js"))
            );
        }
        other => panic!("Expected js, got {:?}", other),
    }
}

#[test]
fn test_script_and_path_are_exclusive() {
    let parser = parser_with_files(&[("a.js", "1")]);
    let err = parser
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com"},
            {"action": "inject_new_document_script", "script": "1", "script_path": "a.js"}
        ]))
        .unwrap_err();
    assert_eq!(err.path(), "actions[1]");
}

#[test]
fn test_serializes_to_json() {
    let page = ScriptParser::new()
        .parse_page(&json!([
            {"action": "get", "url": "https://a.com", "duration": 2},
            {"action": "click", "source": "touch", "x": 3, "y": 4},
            {"action": "screenshot"}
        ]))
        .unwrap();
    let value = serde_json::to_value(&page).unwrap();
    let actions = &value["blocks"][0]["actions"];
    assert_eq!(actions[0]["action"], "get");
    assert_eq!(actions[0]["duration"], 2.0);
    assert_eq!(actions[0]["timeout"], 20.0);
    assert_eq!(actions[1]["source"], "touch");
    assert_eq!(actions[1]["x"], 3);
    assert_eq!(actions[2]["action"], "screenshot");
    assert_eq!(value["playback"], "1x");
}
