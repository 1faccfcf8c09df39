//! Route paths.

pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_AUTH_GOOGLE: &str = "/auth/google";
pub const GET_AUTH_GOOGLE_CALLBACK: &str = "/auth/google/callback";
pub const GET_AUTH_GITHUB: &str = "/auth/github";
pub const GET_AUTH_GITHUB_CALLBACK: &str = "/auth/github/callback";

pub const API_V1_USER: &str = "/api/v1/user";

pub const GET_ADMIN_STATS: &str = "/admin/api/stats";
pub const GET_ADMIN_USERS: &str = "/admin/api/users";
pub const GET_ADMIN_USERS_RECENT: &str = "/admin/api/users/recent";
pub const ADMIN_USERS_ID: &str = "/admin/api/users/{id}";
pub const POST_ADMIN_USERS_ID_ACTIVATE: &str = "/admin/api/users/{id}/activate";
pub const POST_ADMIN_USERS_ID_DEACTIVATE: &str = "/admin/api/users/{id}/deactivate";
pub const POST_ADMIN_USERS_ID_PROMOTE: &str = "/admin/api/users/{id}/promote";
pub const POST_ADMIN_USERS_ID_DEMOTE: &str = "/admin/api/users/{id}/demote";
