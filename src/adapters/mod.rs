//! Adapter implementations, one per upstream product.
//!
//! Each adapter owns its client (constructed once at startup from the
//! environment) and exposes its upstream as a fixed tool catalog through the
//! [`Adapter`](crate::tools::Adapter) trait.

pub mod catalyst;
pub mod ios_xe;
pub mod ise;
pub mod meraki;
pub mod netbox;
pub mod splunk;
pub mod thousandeyes;
