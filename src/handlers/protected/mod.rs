// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here runs behind `require_user`, receives the caller's
// `AuthUser` and a `ScopedClient`, issues exactly one backend call and maps
// a backend failure to 400 with the backend's error payload.
pub mod entries;
pub mod profile;
pub mod user;

// Re-export handler functions for use in routing
pub use entries::create as entry_create;
pub use entries::update as entry_update;
pub use entries::list as entry_list;
pub use entries::delete as entry_delete;

pub use profile::get as profile_get;
pub use profile::post as profile_post;

pub use user::delete as user_delete;
