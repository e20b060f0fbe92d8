//! Synthetic host environment for running outside a real host.
//!
//! Only compiled into development builds. Installing the mock writes fixed
//! launch data (theme palette, platform, test user, auth fields) and a
//! viewport into a [`HostEnvironment`], after which the regular SDK runs
//! unchanged.

use chrono::Utc;
use tracing::info;

use mc_core::config::MockProbe;
use mc_core::constants::mock as defaults;
use mc_core::error::McResult;
use mc_models::{HostUser, InitData, LaunchParams, ThemeParams};

use crate::environment::{HostEnvironment, Viewport};

/// Result of [`MockEnvironment::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockInstall {
    /// Synthetic launch data was written.
    Installed,
    /// A real host was detected and left in place.
    SkippedRealHost,
}

/// Builder for the synthetic launch data.
#[derive(Debug, Clone)]
pub struct MockEnvironment {
    theme: ThemeParams,
    user: HostUser,
    start_param: Option<String>,
    viewport: Viewport,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            theme: mock_theme(),
            user: mock_user(),
            start_param: None,
            viewport: Viewport::expanded(1280, 720),
        }
    }

    /// Launch as if the host passed this start parameter.
    pub fn with_start_param(mut self, start_param: impl Into<String>) -> Self {
        self.start_param = Some(start_param.into());
        self
    }

    /// The synthetic launch parameters, auth date set to now.
    pub fn launch_params(&self) -> McResult<LaunchParams> {
        let init = InitData {
            query_id: Some(defaults::QUERY_ID.to_string()),
            user: Some(self.user.clone()),
            auth_date: Utc::now(),
            hash: defaults::HASH.to_string(),
            start_param: self.start_param.clone(),
        };
        Ok(LaunchParams {
            version: defaults::VERSION.to_string(),
            platform: defaults::PLATFORM.to_string(),
            theme_params: self.theme.clone(),
            start_param: self.start_param.clone(),
            init_data_raw: Some(init.to_query_string()?),
            bot_inline: false,
        })
    }

    /// The launch parameters in the host's query-string form.
    pub fn launch_query(&self) -> McResult<String> {
        self.launch_params()?.to_query_string()
    }

    /// Install into `env`.
    ///
    /// With [`MockProbe::DetectAndSkip`], an environment that already
    /// carries launch data is left untouched.
    pub fn install(&self, env: &HostEnvironment, probe: MockProbe) -> McResult<MockInstall> {
        if probe == MockProbe::DetectAndSkip && env.is_hosted() {
            info!("real host detected, mock environment skipped");
            return Ok(MockInstall::SkippedRealHost);
        }

        env.inject_launch_params(self.launch_query()?, true);
        if env.viewport().is_none() {
            env.report_viewport(self.viewport);
        }
        info!(
            "mock host environment installed (platform={}, user={})",
            defaults::PLATFORM,
            self.user.id
        );
        Ok(MockInstall::Installed)
    }
}

/// Fixed dark palette used by the mock host.
pub fn mock_theme() -> ThemeParams {
    ThemeParams {
        bg_color: Some("#17212b".into()),
        text_color: Some("#f5f5f5".into()),
        hint_color: Some("#708499".into()),
        link_color: Some("#6ab3f3".into()),
        button_color: Some("#5288c1".into()),
        button_text_color: Some("#ffffff".into()),
        secondary_bg_color: Some("#232e3c".into()),
        header_bg_color: Some("#17212b".into()),
        accent_text_color: Some("#6ab2f2".into()),
        section_bg_color: Some("#17212b".into()),
        section_header_text_color: Some("#6ab3f3".into()),
        subtitle_text_color: Some("#708499".into()),
        destructive_text_color: Some("#ec3942".into()),
    }
}

/// The synthetic user the mock host launches for.
pub fn mock_user() -> HostUser {
    HostUser {
        id: defaults::USER_ID,
        first_name: defaults::FIRST_NAME.to_string(),
        last_name: Some(defaults::LAST_NAME.to_string()),
        username: Some(defaults::USERNAME.to_string()),
        language_code: Some(defaults::LANGUAGE_CODE.to_string()),
        is_premium: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_into_detached_environment() {
        let env = HostEnvironment::detached();
        let outcome = MockEnvironment::new().install(&env, MockProbe::DetectAndSkip).unwrap();
        assert_eq!(outcome, MockInstall::Installed);
        assert!(env.is_hosted());
        assert!(env.is_mocked());
        assert!(env.viewport().is_some());

        let params = LaunchParams::parse(&env.launch_params_raw().unwrap()).unwrap();
        assert_eq!(params.platform, "tdesktop");
        let init = params.init_data().unwrap().unwrap();
        assert_eq!(init.user.unwrap().username.as_deref(), Some("testuser"));
        assert_eq!(init.query_id.as_deref(), Some("test_query"));
    }

    #[test]
    fn test_detect_and_skip_keeps_real_host() {
        let env = HostEnvironment::hosted("tgWebAppVersion=7.2&tgWebAppPlatform=ios");
        let outcome = MockEnvironment::new().install(&env, MockProbe::DetectAndSkip).unwrap();
        assert_eq!(outcome, MockInstall::SkippedRealHost);
        assert!(!env.is_mocked());
        assert!(env.launch_params_raw().unwrap().contains("ios"));
    }

    #[test]
    fn test_always_overrides_real_host() {
        let env = HostEnvironment::hosted("tgWebAppVersion=7.2&tgWebAppPlatform=ios");
        let outcome = MockEnvironment::new().install(&env, MockProbe::Always).unwrap();
        assert_eq!(outcome, MockInstall::Installed);
        assert!(env.is_mocked());
    }

    #[test]
    fn test_start_param_reaches_launch_params() {
        let params = MockEnvironment::new().with_start_param("debug").launch_params().unwrap();
        assert!(params.requests_debug());
    }

    #[test]
    fn test_mock_theme_fills_every_slot() {
        assert_eq!(mock_theme().css_vars().len(), 13);
    }
}
