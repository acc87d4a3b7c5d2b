//! The PAN-OS provider: resource and data source registry plus the shared
//! machinery resources are built from.

pub mod fields;
pub mod import;
pub mod lifecycle;
pub mod member;
pub mod scope;

#[cfg(test)]
pub mod testing;

use crate::data_sources::{self, Listing, Single};
use crate::resources;
use anyhow::{Result, bail};
use declarative::Provider;
use lifecycle::{Managed, ObjectResource};
use member::Member;
use panoskit::Device;

/// Provider name, also the prefix of every type name.
pub const NAME: &str = "panos";

/// Register an object resource with its single-object and listing data
/// sources.
fn object<R: ObjectResource>(provider: &mut Provider<dyn Device>) {
    provider
        .register_resource(Managed::<R>::new())
        .register_data_source(Single::<R>::new())
        .register_data_source(Listing::<R>::new());
}

/// Every resource and data source this provider offers.
pub fn provider() -> Provider<dyn Device> {
    let mut provider = Provider::new(NAME);

    object::<resources::application::ApplicationObject>(&mut provider);
    object::<resources::auth::AuthenticationProfile>(&mut provider);
    object::<resources::ldap::LdapProfile>(&mut provider);
    object::<resources::radius::RadiusProfile>(&mut provider);
    object::<resources::tacacs::TacacsPlusProfile>(&mut provider);
    object::<resources::snmp::SnmpServerProfile>(&mut provider);
    object::<resources::local_user::LocalUser>(&mut provider);
    object::<resources::virtual_router::VirtualRouter>(&mut provider);
    object::<resources::url_category::UrlCategory>(&mut provider);
    object::<resources::device_group::DeviceGroup>(&mut provider);
    object::<resources::bgp::AggregateAdvertiseFilter>(&mut provider);
    object::<resources::ike::IkeCryptoProfile>(&mut provider);
    object::<resources::dhcp_relay::DhcpRelay>(&mut provider);

    provider
        .register_resource(resources::certificate::CertificateImport)
        .register_resource(Member::<resources::url_category::UrlCategoryEntry>::new())
        .register_resource(Member::<resources::virtual_router::VirtualRouterEntry>::new())
        .register_resource(Member::<resources::device_group::DeviceGroupEntry>::new())
        .register_data_source(data_sources::audit::AuditCommentHistory);

    provider
}

/// The single section of a mutually exclusive set that is configured.
///
/// `sections` pairs each section name with whether it is set. More than
/// one set section is an error; none yields `None`.
pub fn exclusive<'a>(what: &str, sections: &[(&'a str, bool)]) -> Result<Option<&'a str>> {
    let mut set = sections.iter().filter(|(_, present)| *present).map(|(name, _)| *name);
    let first = set.next();
    if let Some(second) = set.next() {
        bail!(
            "{what}: {} and {second} are mutually exclusive",
            first.unwrap_or_default()
        );
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_consistent() {
        let provider = provider();
        provider.validate().unwrap();
        assert_eq!(provider.resource_types().count(), 17);
        assert!(provider.resource("panos_virtual_router_entry").is_ok());
        assert!(provider.data_source("panos_application_objects").is_ok());
        assert!(provider.data_source("panos_audit_comment_history").is_ok());
    }

    #[test]
    fn test_exclusive() {
        assert_eq!(exclusive("x", &[("a", false), ("b", false)]).unwrap(), None);
        assert_eq!(exclusive("x", &[("a", false), ("b", true)]).unwrap(), Some("b"));
        let err = exclusive("defaults", &[("port", true), ("icmp", true)]).unwrap_err();
        assert_eq!(err.to_string(), "defaults: port and icmp are mutually exclusive");
    }
}
