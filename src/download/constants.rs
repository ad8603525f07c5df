//! Constants for the download module (provider endpoint, timeouts, limits).

/// Google Maps Static API endpoint serving satellite tiles.
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Map type requested from the provider.
pub const MAP_TYPE: &str = "satellite";

/// Whole-request timeout (30 seconds). A timeout counts as a network failure.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest square tile the provider serves on the standard tier.
pub const MAX_IMAGE_SIZE: u16 = 640;

/// Default zoom level for downloads.
pub const DEFAULT_ZOOM: u8 = 20;

/// Default tile size in pixels.
pub const DEFAULT_IMAGE_SIZE: u16 = 640;

/// Default output directory for downloaded tiles.
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw";

/// Error bodies longer than this are truncated before being stored in errors.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 512;
