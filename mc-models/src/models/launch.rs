//! Launch parameters and session data handed over by the host platform.
//!
//! The host passes a query string such as
//! `tgWebAppVersion=7.2&tgWebAppPlatform=ios&tgWebAppThemeParams={...}&tgWebAppData=...`.
//! `tgWebAppData` is itself a url-encoded query string carrying the init
//! data (user, auth date, signature).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use mc_core::constants;
use mc_core::error::{McError, McResult};

const KEY_VERSION: &str = "tgWebAppVersion";
const KEY_PLATFORM: &str = "tgWebAppPlatform";
const KEY_THEME: &str = "tgWebAppThemeParams";
const KEY_DATA: &str = "tgWebAppData";
const KEY_START: &str = "tgWebAppStartParam";
const KEY_BOT_INLINE: &str = "tgWebAppBotInline";

/// Host colour palette. Each slot is a `#rrggbb` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_header_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_text_color: Option<String>,
}

impl ThemeParams {
    /// CSS variable bindings for every populated slot, sorted by name.
    ///
    /// `bg_color` becomes `--tg-theme-bg-color`.
    pub fn css_vars(&self) -> Vec<(String, String)> {
        let Ok(serde_json::Value::Object(map)) = serde_json::to_value(self) else {
            return Vec::new();
        };
        let mut vars: Vec<(String, String)> = map
            .into_iter()
            .filter_map(|(slot, value)| {
                value.as_str().map(|color| {
                    (
                        format!("{}{}", constants::THEME_CSS_PREFIX, slot.replace('_', "-")),
                        color.to_string(),
                    )
                })
            })
            .collect();
        vars.sort();
        vars
    }

    pub fn is_empty(&self) -> bool {
        self.css_vars().is_empty()
    }
}

/// The user the host launched the mini-app for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

impl HostUser {
    /// "First Last", or just the first name.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// Session data restored from the host at mount time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitData {
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub user: Option<HostUser>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub auth_date: DateTime<Utc>,
    pub hash: String,
    #[serde(default)]
    pub start_param: Option<String>,
}

impl InitData {
    /// Parse the url-encoded init data string.
    pub fn parse(raw: &str) -> McResult<Self> {
        let mut query_id = None;
        let mut user = None;
        let mut auth_date = None;
        let mut hash = None;
        let mut start_param = None;

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match &*key {
                "query_id" => query_id = Some(value.into_owned()),
                "user" => {
                    let parsed: HostUser = serde_json::from_str(&value)
                        .map_err(|e| McError::LaunchParams(format!("invalid user: {e}")))?;
                    user = Some(parsed);
                }
                "auth_date" => {
                    let secs: i64 = value
                        .parse()
                        .map_err(|_| McError::LaunchParams(format!("invalid auth_date: {value}")))?;
                    auth_date = Some(DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                        McError::LaunchParams(format!("auth_date out of range: {secs}"))
                    })?);
                }
                "hash" => hash = Some(value.into_owned()),
                "start_param" => start_param = Some(value.into_owned()),
                other => debug!("ignoring init data field {other}"),
            }
        }

        Ok(Self {
            query_id,
            user,
            auth_date: auth_date
                .ok_or_else(|| McError::LaunchParams("init data missing auth_date".into()))?,
            hash: hash.ok_or_else(|| McError::LaunchParams("init data missing hash".into()))?,
            start_param,
        })
    }

    /// Serialize back to the url-encoded form the host uses.
    pub fn to_query_string(&self) -> McResult<String> {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(query_id) = &self.query_id {
            out.append_pair("query_id", query_id);
        }
        if let Some(user) = &self.user {
            out.append_pair("user", &serde_json::to_string(user)?);
        }
        out.append_pair("auth_date", &self.auth_date.timestamp().to_string());
        if let Some(start_param) = &self.start_param {
            out.append_pair("start_param", start_param);
        }
        out.append_pair("hash", &self.hash);
        Ok(out.finish())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Everything the host passes to the mini-app at launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchParams {
    pub version: String,
    pub platform: String,
    #[serde(default)]
    pub theme_params: ThemeParams,
    #[serde(default)]
    pub start_param: Option<String>,
    #[serde(default)]
    pub init_data_raw: Option<String>,
    #[serde(default)]
    pub bot_inline: bool,
}

impl LaunchParams {
    /// Parse launch parameters from the host's query string.
    ///
    /// A leading `#` or `?` is ignored.
    pub fn parse(raw: &str) -> McResult<Self> {
        let raw = raw.trim().trim_start_matches(['#', '?']);
        if raw.is_empty() {
            return Err(McError::LaunchParams("launch params are empty".into()));
        }

        let mut version = None;
        let mut platform = None;
        let mut theme_params = ThemeParams::default();
        let mut start_param = None;
        let mut init_data_raw = None;
        let mut bot_inline = false;

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match &*key {
                KEY_VERSION => version = Some(value.into_owned()),
                KEY_PLATFORM => platform = Some(value.into_owned()),
                KEY_THEME => {
                    theme_params = serde_json::from_str(&value)
                        .map_err(|e| McError::LaunchParams(format!("invalid theme params: {e}")))?;
                }
                KEY_START if !value.is_empty() => start_param = Some(value.into_owned()),
                KEY_DATA if !value.is_empty() => init_data_raw = Some(value.into_owned()),
                KEY_BOT_INLINE => bot_inline = value == "1" || value == "true",
                _ => {}
            }
        }

        Ok(Self {
            version: version
                .ok_or_else(|| McError::LaunchParams(format!("missing {KEY_VERSION}")))?,
            platform: platform
                .ok_or_else(|| McError::LaunchParams(format!("missing {KEY_PLATFORM}")))?,
            theme_params,
            start_param,
            init_data_raw,
            bot_inline,
        })
    }

    /// Serialize to the host's query-string form.
    pub fn to_query_string(&self) -> McResult<String> {
        let mut out = form_urlencoded::Serializer::new(String::new());
        out.append_pair(KEY_VERSION, &self.version);
        out.append_pair(KEY_PLATFORM, &self.platform);
        out.append_pair(KEY_THEME, &serde_json::to_string(&self.theme_params)?);
        if let Some(start_param) = &self.start_param {
            out.append_pair(KEY_START, start_param);
        }
        if let Some(data) = &self.init_data_raw {
            out.append_pair(KEY_DATA, data);
        }
        if self.bot_inline {
            out.append_pair(KEY_BOT_INLINE, "1");
        }
        Ok(out.finish())
    }

    /// Decode the embedded init data, if any.
    pub fn init_data(&self) -> McResult<Option<InitData>> {
        self.init_data_raw.as_deref().map(InitData::parse).transpose()
    }

    /// Whether the host asked for debug mode via the start parameter.
    pub fn requests_debug(&self) -> bool {
        self.start_param.as_deref() == Some(constants::DEBUG_START_PARAM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> HostUser {
        HostUser {
            id: 42,
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            username: Some("ada".into()),
            language_code: Some("en".into()),
            is_premium: None,
        }
    }

    #[test]
    fn test_parse_minimal_launch_params() {
        let params = LaunchParams::parse("#tgWebAppVersion=7.2&tgWebAppPlatform=ios").unwrap();
        assert_eq!(params.version, "7.2");
        assert_eq!(params.platform, "ios");
        assert!(params.start_param.is_none());
        assert!(params.init_data().unwrap().is_none());
        assert!(params.theme_params.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_platform() {
        let err = LaunchParams::parse("tgWebAppVersion=7.2").unwrap_err();
        assert!(err.to_string().contains("tgWebAppPlatform"));
        assert!(LaunchParams::parse("   ").is_err());
    }

    #[test]
    fn test_debug_start_param() {
        let params = LaunchParams::parse(
            "tgWebAppVersion=7.2&tgWebAppPlatform=android&tgWebAppStartParam=debug",
        )
        .unwrap();
        assert!(params.requests_debug());
    }

    #[test]
    fn test_nested_init_data_survives_encoding() {
        let init = InitData {
            query_id: Some("q1".into()),
            user: Some(sample_user()),
            auth_date: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            hash: "abc".into(),
            start_param: None,
        };
        let params = LaunchParams {
            version: "7.2".into(),
            platform: "tdesktop".into(),
            theme_params: ThemeParams {
                bg_color: Some("#ffffff".into()),
                ..ThemeParams::default()
            },
            start_param: None,
            init_data_raw: Some(init.to_query_string().unwrap()),
            bot_inline: false,
        };

        let raw = params.to_query_string().unwrap();
        let parsed = LaunchParams::parse(&raw).unwrap();
        let restored = parsed.init_data().unwrap().unwrap();
        assert_eq!(restored.user_id(), Some(42));
        assert_eq!(restored.user.unwrap().display_name(), "Ada Lovelace");
        assert_eq!(parsed.theme_params.bg_color.as_deref(), Some("#ffffff"));
    }

    #[test]
    fn test_init_data_requires_hash() {
        let err = InitData::parse("auth_date=1700000000").unwrap_err();
        assert!(err.to_string().contains("hash"));
    }

    #[test]
    fn test_out_of_range_auth_date_is_not_missing() {
        let raw = format!("auth_date={}&hash=h", i64::MAX);
        let err = InitData::parse(&raw).unwrap_err().to_string();
        assert!(err.contains("out of range"), "{err}");
        assert!(!err.contains("missing"));
    }

    #[test]
    fn test_theme_css_vars() {
        let theme = ThemeParams {
            bg_color: Some("#17212b".into()),
            button_text_color: Some("#ffffff".into()),
            ..ThemeParams::default()
        };
        assert_eq!(
            theme.css_vars(),
            vec![
                ("--tg-theme-bg-color".to_string(), "#17212b".to_string()),
                ("--tg-theme-button-text-color".to_string(), "#ffffff".to_string()),
            ]
        );
    }
}
