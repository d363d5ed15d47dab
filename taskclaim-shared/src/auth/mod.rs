/// Authentication utilities
///
/// Sessions are issued by the OAuth provider; this crate only validates them.
///
/// # Modules
///
/// - [`session`]: HS256 session token validation and the `SessionUser` context

pub mod session;
