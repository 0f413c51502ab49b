/// Router Module Index
///
/// Organizes the application's routing into scope-segregated modules. The
/// module boundaries line up with the access middleware's scope table: one
/// module per protected prefix plus the public surface, so a route can never
/// silently land in the wrong scope.

/// Routes accessible without a session: health, registration, sign-in.
pub mod public;

/// Routes that need a session but no particular role (`/me`).
pub mod authenticated;

/// Routes under the `/admin` prefix; the access middleware requires an
/// `admin` token before anything here runs.
pub mod admin;

/// Routes under the `/mensajero` prefix; the access middleware requires a
/// `courier` token before anything here runs.
pub mod courier;
