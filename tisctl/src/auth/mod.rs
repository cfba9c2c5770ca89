//! Authentication and authorization.
//!
//! Browser clients log in via `/users/login` with email and password and receive a signed
//! access token in an HTTP-only cookie. Every protected route group is wrapped in the access
//! gate, which verifies that cookie and publishes the caller's [`identity::Identity`] for
//! the rest of the request.
//!
//! There is no server-side session store. A token stays valid until it expires; logout only
//! clears the cookie on the client.
//!
//! # Modules
//!
//! - [`gate`]: Route protection middleware (`Authenticated` and `AdminOnly` modes)
//! - [`identity`]: Extractors for the authenticated identity and the unit-of-work context
//! - [`password`]: Password hashing and verification using Argon2
//! - [`roles`]: The fixed role registry (`admin`, `inspector`, `analyst`)
//! - [`session`]: Access token issuing and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! pub async fn add_driver(
//!     State(state): State<AppState>,
//!     context: RequestContext,
//!     Json(request): Json<AddDriverRequest>,
//! ) -> Result<(StatusCode, Json<DriverCreatedResponse>)> {
//!     // context carries the identity the gate published
//! }
//! ```

pub mod gate;
pub mod identity;
pub mod password;
pub mod roles;
pub mod session;
