//! Bearer-token authentication primitives.
//!
//! Tokens are issued by the account service; this server only validates
//! them and reads the doer id from `sub`.

pub mod jwt;
