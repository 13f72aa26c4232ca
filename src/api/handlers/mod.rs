mod admin;
mod canonical;
mod pages;
mod render;

pub use admin::{admin_purge, health, rebuild_routes, route_table};
pub use canonical::{get_canonical, put_canonical};
pub use pages::{create_page, delete_page, get_page, list_pages, update_page};
pub use render::serve_page;

