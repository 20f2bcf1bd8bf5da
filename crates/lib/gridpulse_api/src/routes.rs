//! Route paths.

pub const GET_LIVENESS: &str = "/livenes";
pub const GET_LIVENESS_ALIAS: &str = "/liveness";
pub const POST_USER_REGISTER: &str = "/api/v1/user/register";
pub const POST_USER_LOGIN: &str = "/api/v1/user/login";
pub const POST_USER_REFRESH: &str = "/api/v1/user/refresh";
pub const GET_USER: &str = "/api/v1/user";
