use axum::Json;
use serde::Serialize;

const GREETING: &str = "Hello Hono!";

pub async fn index() -> &'static str { GREETING }

#[derive(Serialize)]
pub struct Hello {
    ok: bool,
    message: &'static str,
}

pub async fn hello() -> Json<Hello> { Json(Hello { ok: true, message: GREETING }) }
