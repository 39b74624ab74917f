//! Named rooms for scoped fan-out.

pub mod registry;

pub use registry::RoomRegistry;

/// Room shared by every admin watching a city.
pub fn city(city_id: i64) -> String {
    format!("city:{city_id}")
}

/// Room shared by every admin watching a branch.
pub fn branch(branch_id: i64) -> String {
    format!("branch:{branch_id}")
}

/// Room for admins that watch every order.
pub const ADMIN_ALL: &str = "admin:all";
