use rocket::Route;

mod contestants;
mod contests;
mod health;
mod votes;

/// Where the routes from [`routes`] are mounted.
pub const API_BASE: &str = "/api";

/// Service status routes, mounted at the root.
pub fn status_routes() -> Vec<Route> {
    health::routes()
}

/// The contest, contestant and vote routes, mounted at [`API_BASE`].
pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(contests::routes());
    routes.extend(contestants::routes());
    routes.extend(votes::routes());
    routes
}
