use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod reset_token;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/verify/:token", get(handlers::verification))
        .route("/signin", post(handlers::signin))
        .route("/forgotPassword", post(handlers::forgot_password))
        .route("/resetPassword/:token", patch(handlers::reset_password))
        .route("/updateMyPassword", patch(handlers::update_my_password))
        .route("/logout", get(handlers::logout))
}
