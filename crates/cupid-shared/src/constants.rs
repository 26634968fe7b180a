/// Avatar shown when a user has no profile photo
pub const DEFAULT_AVATAR: &str = "assets/images/default-avatar.png";

/// Maximum message length in characters, after trimming
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Default discovery radius in kilometres
pub const DEFAULT_NEARBY_KM: f64 = 100.0;

/// Mean Earth radius in kilometres (haversine)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Outbound queue depth per realtime session
pub const SESSION_QUEUE_DEPTH: usize = 256;

/// Maximum length of a block reason or report description
pub const MAX_REASON_LEN: usize = 500;
