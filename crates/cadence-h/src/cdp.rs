use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

pub type LaunchError = Box<dyn std::error::Error + Send + Sync>;

/// How to start Chromium.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub visible: bool,
    /// Overrides `CHROME_BIN`.
    pub chrome_bin: Option<PathBuf>,
}

/// A Chromium process with one tab, driven over the DevTools protocol.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: PathBuf,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, LaunchError> {
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&user_data_dir);

        if options.visible {
            tracing::info!("Launching browser in visible mode");
            builder = builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Some(chrome_bin) = chrome_executable(options.chrome_bin.as_deref()) {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin.display());
            builder = builder.chrome_executable(chrome_bin);
        }

        let (browser, mut handler) = Browser::launch(
            builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        forward_console(&page).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir,
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), LaunchError> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if self.cleanup_user_data_dir {
            if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
                tracing::debug!(
                    "Failed to clean up user-data-dir {}: {}",
                    self.user_data_dir.display(),
                    e
                );
            }
        }
        Ok(())
    }
}

/// Page console output goes to the log at debug level.
async fn forward_console(page: &Page) -> Result<(), LaunchError> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| arg.description.clone().unwrap_or_else(|| "unknown".into()))
                .collect();
            tracing::debug!("Browser console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });
    Ok(())
}

/// alert/confirm/prompt block the page's JS thread, so accept them at once.
async fn accept_dialogs(page: &Page) -> Result<(), LaunchError> {
    let mut events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!("Accepting dialog: {} ({:?})", event.message, event.r#type);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::error!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

fn chrome_executable(configured: Option<&Path>) -> Option<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("CHROME_BIN").map(PathBuf::from))
}

fn resolve_user_data_dir() -> Result<(PathBuf, bool), LaunchError> {
    if let Ok(dir) = std::env::var("CADENCE_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!(
            "Using user data dir from CADENCE_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let unique = format!("cadence-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
