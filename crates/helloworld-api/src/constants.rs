//! Route paths and HTTP-level names

pub const SUBMIT_PATH: &str = "/helloworld";
pub const FORM_PATH: &str = "/helloworld/form";
pub const TOKEN_PATH: &str = "/helloworld/token";
pub const CANCEL_PATH: &str = "/helloworld/cancel";
pub const HEALTH_PATH: &str = "/health";

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "hw_session";

/// Session key holding the signed-in user, written by whatever authenticates visitors
pub const SESSION_USER_KEY: &str = "user";

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_FIELD: &str = "csrf_token";

/// Form field naming where to send the visitor afterwards
pub const RETURN_FIELD: &str = "return";

/// Multipart name of the image input
pub const IMAGE_FIELD: &str = "jform[imageinfo][image]";
