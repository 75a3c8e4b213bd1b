use rocket::{
    serde::json::{json, Json, Value},
    Route,
};

pub fn routes() -> Vec<Route> {
    routes![index, health]
}

#[get("/")]
fn index() -> Json<Value> {
    Json(json!({
        "message": "Yi-Vote API is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
    }))
}

#[get("/health")]
fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
