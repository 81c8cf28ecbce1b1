//! Builders for the page scripts the script runner evaluates.
//!
//! Every builder binds the target to a local `element` variable; the
//! selector itself is always passed as `arguments[0]`, never spliced in.

const XPATH_PREFIX: &str = "xpath/";

const XPATH_SELECT_ELEMENT: &str =
    "let element = document.evaluate(arguments[0], document).iterateNext();\n";
const CSS_SELECT_ELEMENT: &str = "let element = document.querySelector(arguments[0]);\n";
const SELECT_WINDOW: &str = "let element = window;\n";
const CHECK_ELEMENT_EXISTS: &str = "if (!element) return false;\n";
const SCROLL_INTO_VIEW: &str = "element.scrollIntoView();\n";
const CLICK: &str = "element.click();\n";
const RETURN_SUCCESS: &str = "return true;\n";

const READ_SCROLL_POSITION: &str = "if (!element) return [false, 0];\nreturn [true, element[arguments[1]]];\n";
const SCROLL_TO: &str = "element.scrollTo({top: arguments[1], behavior: 'smooth'});\n";

const VIEWPORT_VALUES: &str = r#"let found = false;
if (arguments[0] && element) found = true;
if (found && arguments[1]) element.scrollIntoView();
let rect = new DOMRect();
if (found) rect = element.getBoundingClientRect();
return [found, window.innerHeight, window.innerWidth, rect.left, rect.top, rect.width, rect.height];
"#;

const WAIT_FOR_ELEMENT: &str = r#"const [selector, timeoutMs] = arguments;
if (find(selector)) {
  return true;
}
return await new Promise(resolve => {
  const timer = timeoutMs === null ? null : setTimeout(() => {
    observer.disconnect();
    resolve(false);
  }, timeoutMs);
  const observer = new MutationObserver(() => {
    if (find(selector)) {
      observer.disconnect();
      clearTimeout(timer);
      resolve(true);
    }
  });
  observer.observe(document.documentElement, {childList: true, subtree: true});
});
"#;

const TYPE_INTO_ACTIVE_ELEMENT: &str = r#"const element = document.activeElement;
if (!element) return false;
if (element.isContentEditable) {
  element.textContent += arguments[0];
} else if ('value' in element) {
  element.value += arguments[0];
} else {
  return false;
}
element.dispatchEvent(new InputEvent('input', {bubbles: true, data: arguments[0]}));
return true;
"#;

/// A selector with its `xpath/` prefix stripped, plus the statement that
/// binds the matching element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    pub selector: String,
    pub script: String,
}

impl ElementQuery {
    pub fn new(selector: &str) -> Self {
        match selector.strip_prefix(XPATH_PREFIX) {
            Some(xpath) => Self {
                selector: xpath.to_string(),
                script: XPATH_SELECT_ELEMENT.to_string(),
            },
            None => Self {
                selector: selector.to_string(),
                script: CSS_SELECT_ELEMENT.to_string(),
            },
        }
    }

    /// Binds `element` to `window` instead of a page element.
    pub fn window() -> Self {
        Self {
            selector: String::new(),
            script: SELECT_WINDOW.to_string(),
        }
    }

    pub fn check_exists(mut self) -> Self {
        self.script.push_str(CHECK_ELEMENT_EXISTS);
        self
    }

    pub fn scroll_into_view(mut self) -> Self {
        self.script.push_str(SCROLL_INTO_VIEW);
        self
    }

    pub fn click(mut self) -> Self {
        self.script.push_str(CLICK);
        self
    }

    pub fn return_success(mut self) -> Self {
        self.script.push_str(RETURN_SUCCESS);
        self
    }

    fn append(mut self, tail: &str) -> Self {
        self.script.push_str(tail);
        self
    }
}

/// Clicks the element; evaluates to `false` when nothing matched.
pub fn click_script(selector: &str, scroll_into_view: bool) -> ElementQuery {
    let query = ElementQuery::new(selector).check_exists();
    let query = if scroll_into_view {
        query.scroll_into_view()
    } else {
        query
    };
    query.click().return_success()
}

/// Evaluates to `[found, offset]`; takes the offset property as `arguments[1]`.
pub fn scroll_position_script(selector: Option<&str>) -> ElementQuery {
    selector
        .map(ElementQuery::new)
        .unwrap_or_else(ElementQuery::window)
        .append(READ_SCROLL_POSITION)
}

/// Scrolls to the offset passed as `arguments[1]`.
pub fn scroll_to_script(selector: Option<&str>) -> ElementQuery {
    selector
        .map(ElementQuery::new)
        .unwrap_or_else(ElementQuery::window)
        .append(SCROLL_TO)
}

/// The property holding the scroll offset of the scrolled target.
pub fn scroll_field(has_selector: bool) -> &'static str {
    if has_selector { "scrollTop" } else { "scrollY" }
}

/// Evaluates to `[found, innerHeight, innerWidth, left, top, width, height]`.
/// Takes the selector (or `null`) as `arguments[0]` and a scroll-into-view
/// flag as `arguments[1]`.
pub fn viewport_script(selector: Option<&str>) -> ElementQuery {
    match selector {
        Some(selector) => ElementQuery::new(selector).append(VIEWPORT_VALUES),
        None => ElementQuery {
            selector: String::new(),
            script: format!("let element = null;\n{}", VIEWPORT_VALUES),
        },
    }
}

/// Resolves to whether the element appeared before `arguments[1]` ms passed
/// (`null` waits forever).
pub fn wait_for_element_script(selector: &str) -> ElementQuery {
    let (selector, find) = match selector.strip_prefix(XPATH_PREFIX) {
        Some(xpath) => (xpath, "document.evaluate(s, document).iterateNext()"),
        None => (selector, "document.querySelector(s)"),
    };
    ElementQuery {
        selector: selector.to_string(),
        script: format!("const find = (s) => {};\n{}", find, WAIT_FOR_ELEMENT),
    }
}

/// Appends `arguments[0]` to the focused input and fires an `input` event.
pub fn type_text_script() -> &'static str {
    TYPE_INTO_ACTIVE_ELEMENT
}

/// Predicate that holds once `document.readyState` reached `state`. A page may
/// jump straight to `complete`, which satisfies every requested state.
pub fn ready_state_predicate(state: &str) -> String {
    format!(
        "let state = document.readyState;\nreturn state === '{}' || state === 'complete';\n",
        state
    )
}
