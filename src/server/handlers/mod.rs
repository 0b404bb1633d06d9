//! HTTP request handlers.

mod clients;
mod contracts;
mod engines;
mod health;
mod realtime;
mod testimonials;
mod vault;

pub use clients::{create_client, list_clients};
pub use contracts::{
    analyze_contract, create_contract, get_contract, list_contracts, negotiation_email,
    scope_check, sign_contract, upload_contract,
};
pub use engines::{mine_assets, radar_scan, rnd_audit};
pub use health::health;
pub use realtime::channel_auth;
pub use testimonials::{
    approve_testimonial, describe_magic_link, list_testimonials, request_testimonial,
    submit_magic_link,
};
pub use vault::{get_vault, update_vault};
