use super::page;
use crate::error::Result;
use crate::router::{AppState, Request, Response};
use serde_json::json;

pub async fn index(req: Request, state: AppState) -> Result<Response> {
    page(&state, &req, "pages/home.html", &json!({}))
}
