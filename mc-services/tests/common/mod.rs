//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use mc_core::config::AppConfig;
use mc_host::{HostEnvironment, Viewport};
use mc_models::{HostUser, InitData, LaunchParams, ThemeParams};
use mc_services::{AppEvent, AppRoot};
use mc_sync::MemoryProvider;

/// User id carried by [`hosted_launch_query`].
pub const HOST_USER_ID: i64 = 42;

/// Launch data as a real host would pass it: theme, platform and a signed
/// init data block for [`HOST_USER_ID`].
pub fn hosted_launch_query() -> String {
    let init = InitData {
        query_id: Some("AAE-host-query".into()),
        user: Some(HostUser {
            id: HOST_USER_ID,
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            username: Some("ada".into()),
            language_code: Some("en".into()),
            is_premium: None,
        }),
        auth_date: Utc::now(),
        hash: "0f1e2d3c".into(),
        start_param: None,
    };
    let params = LaunchParams {
        version: "7.10".into(),
        platform: "android".into(),
        theme_params: ThemeParams {
            bg_color: Some("#ffffff".into()),
            text_color: Some("#000000".into()),
            button_color: Some("#2481cc".into()),
            ..ThemeParams::default()
        },
        start_param: None,
        init_data_raw: Some(init.to_query_string().expect("init data encodes")),
        bot_inline: false,
    };
    params.to_query_string().expect("launch params encode")
}

/// A hosted environment that has already reported its viewport.
pub fn hosted_env() -> HostEnvironment {
    let env = HostEnvironment::hosted(hosted_launch_query());
    env.report_viewport(Viewport::expanded(390, 844));
    env
}

/// A hosted environment whose host never reports a viewport.
pub fn hosted_env_without_viewport() -> HostEnvironment {
    HostEnvironment::hosted(hosted_launch_query())
}

/// Create a default test configuration.
pub fn create_test_config() -> AppConfig {
    AppConfig::default()
}

/// Create an in-memory sync provider with a small buffer suitable for tests.
pub fn create_test_provider() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::with_capacity(64))
}

/// Compose an application against `env` with default config.
pub fn create_test_app(env: HostEnvironment) -> AppRoot {
    AppRoot::new(create_test_config(), env, create_test_provider())
        .expect("default config composes")
}

/// Wait for the first event matching `pred`, skipping others.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<AppEvent>, mut pred: F) -> AppEvent
where
    F: FnMut(&AppEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event bus closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
