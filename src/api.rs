use rocket::Route;

pub mod auth;
pub mod awards;
mod common;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(awards::routes());
    routes.extend(auth::routes());
    routes
}
