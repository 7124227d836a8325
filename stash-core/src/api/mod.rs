//! API surface consumed by the stores: response envelopes, entity types,
//! and the transport trait.

mod client;
mod envelope;
mod types;

pub use client::{ApiClient, TransportConfig, AUTHORIZATION_HEADER};
pub use envelope::{ApiResponse, Failure, UNKNOWN_ERROR_MESSAGE};
pub use types::{
    ApiKey, DevPackage, DevPackagePatch, DevPackageRelease, DevPackageView, DevPackageViewPatch, Role,
    UserInfo, UserInfoPatch,
};
