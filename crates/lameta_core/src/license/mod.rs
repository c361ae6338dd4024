//! Session, file and collection licensing.
//!
//! # Responsibility
//! - Normalize archive-specific access labels into shared
//!   `ldac:DataReuseLicense` entities.
//! - Track which license each exported file ends up with.
//!
//! # Invariants
//! - Normalizing an already-normalized id is a no-op.
//! - Sessions with the same archive and access key share one license id.
//! - Access-type terms are emitted only when a license references them.

pub mod access;
pub mod manager;

pub use access::{
    collection_license, create_access_license, create_distinct_licenses,
    create_ldac_access_type_definitions, create_referenced_license, is_raw_access_value,
    normalized_license_id, sanitize_access_value, session_license_id, AUTHORIZED_ACCESS,
    OPEN_ACCESS,
};
pub use manager::LicenseManager;
