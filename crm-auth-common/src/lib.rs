//! CRM Auth Common Types
//!
//! Shared types used by the auth adapter and the `crm-auth` command line tool.

pub mod access;
pub mod credentials;
pub mod location;
pub mod redirect;
pub mod sale;

pub use access::{AccessParams, Role};
pub use credentials::{Credentials, SetPasswordParams};
pub use location::Location;
pub use redirect::{RedirectMessage, RedirectSignal};
pub use sale::{Avatar, Identifier, Identity, Sale};
