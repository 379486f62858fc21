//! HTTP API handlers for musiclib-web

pub mod albums;
pub mod contributors;
pub mod health;
pub mod lookups;
pub mod memberships;
pub mod music_groups;
pub mod performances;
pub mod roles;
pub mod search;
pub mod songs;

pub use albums::album_routes;
pub use contributors::contributor_routes;
pub use health::health_routes;
pub use lookups::lookup_routes;
pub use memberships::membership_routes;
pub use music_groups::music_group_routes;
pub use performances::performance_routes;
pub use roles::role_routes;
pub use search::search_routes;
pub use songs::song_routes;

pub use crate::error::{ApiError, ApiResult};
