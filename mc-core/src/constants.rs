//! Application-wide constants.

/// Application name, also shown on the sign-in prompt.
pub const APP_NAME: &str = "Jazz Chat";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default sync peer the chat connects to.
pub const DEFAULT_SYNC_PEER: &str = "wss://cloud.jazz.tools/?key=chat-example-jazz@garden.co";

/// Start parameter value that turns on host SDK debug mode.
pub const DEBUG_START_PARAM: &str = "debug";

/// Default capacity of the application event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Default capacity of the sync provider's update channel.
pub const SYNC_EVENT_CAPACITY: usize = 256;

/// Prefix of CSS variables bound from host theme parameters.
pub const THEME_CSS_PREFIX: &str = "--tg-theme-";

/// Prefix of CSS variables bound from the host viewport.
pub const VIEWPORT_CSS_PREFIX: &str = "--tg-viewport-";

/// Mock environment defaults.
pub mod mock {
    /// Platform identifier reported by the mock host.
    pub const PLATFORM: &str = "tdesktop";
    /// Host SDK protocol version reported by the mock host.
    pub const VERSION: &str = "7.2";
    /// Synthetic query id.
    pub const QUERY_ID: &str = "test_query";
    /// Synthetic user id.
    pub const USER_ID: i64 = 123_456_789;
    pub const FIRST_NAME: &str = "Test";
    pub const LAST_NAME: &str = "User";
    pub const USERNAME: &str = "testuser";
    pub const LANGUAGE_CODE: &str = "en";
    /// Synthetic signature; never verified.
    pub const HASH: &str = "mock-hash";
}
