//! Waldur REST resource paths.
//!
//! Every path ends with a slash: the API treats `/projects` and `/projects/` differently.

pub const CUSTOMERS: &str = "/customers/";
pub const PROJECTS: &str = "/projects/";
pub const MARKETPLACE_RESOURCES: &str = "/marketplace-resources/";
pub const MARKETPLACE_PUBLIC_OFFERINGS: &str = "/marketplace-public-offerings/";
pub const INVOICES: &str = "/invoices/";
pub const ROLES: &str = "/roles/";
pub const USER_INVITATIONS: &str = "/user-invitations/";
pub const QUERY: &str = "/query/";
