//! `panos_certificate_import`: certificates imported as PEM or PKCS#12.
//!
//! The device never hands back the passphrase, so each read re-exports the
//! certificate with the configured one and compares the public key with the
//! one recorded at import. A refused export or a different key blanks the
//! configured format block, which plans a re-import.

use crate::provider::exclusive;
use crate::provider::scope;
use anyhow::{Context, Result, bail};
use declarative::{Attribute, Attrs, Identifier, Resource, ResourceData, Schema, identifier};
use panoskit::{Certificate, CertificateImport as Import, Device, Error, Objects, SHARED, Scope};

identifier! {
    pub struct CertificateId { template, template_stack, vsys, name }
}

pub struct CertificateImport;

const FORMATS: [&str; 2] = ["pem", "pkcs12"];

fn pem_schema() -> Schema {
    Schema::new()
        .attr("certificate", Attribute::string().required())
        .attr("private_key", Attribute::string().optional().sensitive())
        .attr("passphrase", Attribute::string().optional().sensitive())
}

fn pkcs12_schema() -> Schema {
    Schema::new()
        .attr("certificate", Attribute::string().required().describe("Base64 bundle"))
        .attr("passphrase", Attribute::string().required().sensitive())
}

fn load(d: &ResourceData) -> Result<Import> {
    let chosen = exclusive("certificate format", &FORMATS.map(|f| (f, d.has(f))))?;
    let Some(format) = chosen.and_then(|f| d.get_block(f).map(|b| (f, b))) else {
        bail!("one of pem or pkcs12 is required");
    };
    Ok(match format {
        ("pem", b) => Import::Pem {
            certificate: b.get_string("certificate"),
            private_key: b.get_string("private_key"),
            passphrase: b.get_string("passphrase"),
        },
        (_, b) => Import::Pkcs12 {
            certificate: b.get_string("certificate"),
            passphrase: b.get_string("passphrase"),
        },
    })
}

fn target(id: &CertificateId) -> Scope {
    Scope::template(&id.template, &id.template_stack, &id.vsys)
}

impl Resource<dyn Device> for CertificateImport {
    fn type_name(&self) -> &'static str {
        "panos_certificate_import"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr(
                "pem",
                Attribute::single_block(pem_schema())
                    .optional()
                    .force_new()
                    .conflicts_with(&["pkcs12"]),
            )
            .attr(
                "pkcs12",
                Attribute::single_block(pkcs12_schema())
                    .optional()
                    .force_new()
                    .conflicts_with(&["pem"]),
            )
            .attr("public_key", Attribute::string().computed())
    }

    fn create(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = CertificateId::from_data(d);
        id.validate()?;
        let import = load(d)?;

        log::debug!("{}: importing {} ({})", self.type_name(), id.name, import.format());
        let container = Objects::<Certificate>::new(device).container(&target(&id))?;
        device
            .backend()
            .import_certificate(&container, &id.name, &import)
            .with_context(|| format!("importing certificate {}", id.name))?;

        let public_key = device
            .backend()
            .export_certificate(&container, &id.name, import.passphrase())
            .with_context(|| format!("verifying imported certificate {}", id.name))?;

        d.set_id(id.encode());
        d.set("public_key", public_key);
        self.read(device, d)
    }

    fn read(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = CertificateId::decode(d.id())?;
        id.write_to(d);
        let objects = Objects::<Certificate>::new(device);
        let scope = target(&id);

        let live = match objects.get(&scope, &id.name) {
            Ok(live) => live,
            Err(e) if e.is_not_found() => {
                log::info!("{}: {} is gone ({e})", self.type_name(), d.id());
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", d.id())),
        };

        let recorded = d.get_string("public_key");
        let configured = FORMATS
            .into_iter()
            .find_map(|f| d.get_block(f).map(|b| (f, b)));
        let Some((format, block)) = configured else {
            d.set("public_key", live.public_key);
            return Ok(());
        };

        let container = objects.container(&scope)?;
        let passphrase = block.get_string("passphrase");
        let public_key = match device
            .backend()
            .export_certificate(&container, &id.name, &passphrase)
        {
            Ok(exported) if recorded.is_empty() || exported == recorded => {
                d.set("public_key", exported);
                return Ok(());
            }
            Ok(exported) => {
                log::info!("{}: public key of {} changed", self.type_name(), id.name);
                exported
            }
            Err(Error::Device(reason)) => {
                log::info!("{}: {} ({reason})", self.type_name(), id.name);
                live.public_key
            }
            Err(e) => return Err(e).with_context(|| format!("exporting {}", id.name)),
        };
        d.set_block(format, None);
        d.set("public_key", public_key);
        Ok(())
    }

    fn delete(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = CertificateId::decode(d.id())?;
        match Objects::<Certificate>::new(device).delete(&target(&id), &id.name) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                log::debug!("{}: {} already gone", self.type_name(), id.encode());
            }
            Err(e) => return Err(e).with_context(|| format!("deleting {}", id.encode())),
        }
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{create, firewall, panorama, read};
    use serde_json::json;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----";

    #[test]
    fn test_pem_without_passphrase() {
        let (fw, _) = firewall();
        let d = create(
            &CertificateImport,
            &fw,
            json!({"name": "web", "pem": [{"certificate": PEM}]}),
        );
        assert_eq!(d.id(), "::shared:web");
        assert_eq!(d.get_string("public_key"), PEM);
    }

    #[test]
    fn test_passphrase_is_verified_on_read() {
        let (pano, backend) = panorama();
        backend.add_template("dc").unwrap();
        let d = create(
            &CertificateImport,
            &pano,
            json!({"template": "dc", "name": "vpn",
                   "pkcs12": [{"certificate": "MIIKbundle", "passphrase": "p1"}]}),
        );
        assert!(d.get_string("public_key").starts_with("-----BEGIN CERTIFICATE-----"));

        // Re-imported elsewhere with another passphrase.
        let scope = Scope::template("dc", "", "shared");
        let container = Objects::<Certificate>::new(&pano).container(&scope).unwrap();
        let reimport = Import::Pkcs12 {
            certificate: "MIIKbundle".into(),
            passphrase: "p2".into(),
        };
        panoskit::Backend::import_certificate(&backend, &container, "vpn", &reimport).unwrap();

        let observed = read(&CertificateImport, &pano, &d);
        assert!(!observed.is_gone());
        assert!(observed.get_block("pkcs12").is_none());
        assert_eq!(observed.get_string("public_key"), d.get_string("public_key"));
    }

    #[test]
    fn test_changed_public_key_blanks_format() {
        let (fw, backend) = firewall();
        let d = create(
            &CertificateImport,
            &fw,
            json!({"name": "vpn", "pkcs12": [{"certificate": "MIIKbundle", "passphrase": "pw"}]}),
        );
        assert_eq!(read(&CertificateImport, &fw, &d).get_block("pkcs12"), d.get_block("pkcs12"));

        // Another bundle under the same name and passphrase.
        let container = Objects::<Certificate>::new(&fw)
            .container(&Scope::template("", "", SHARED))
            .unwrap();
        let other = Import::Pkcs12 {
            certificate: "MIIKother".into(),
            passphrase: "pw".into(),
        };
        panoskit::Backend::import_certificate(&backend, &container, "vpn", &other).unwrap();

        let observed = read(&CertificateImport, &fw, &d);
        assert!(observed.get_block("pkcs12").is_none());
        assert_ne!(observed.get_string("public_key"), d.get_string("public_key"));
    }

    #[test]
    fn test_format_required_and_exclusive() {
        let (fw, _) = firewall();
        let mut none = ResourceData::new(json!({"name": "x"}).as_object().cloned().unwrap());
        assert!(CertificateImport.create(&fw, &mut none).is_err());

        let mut both = ResourceData::new(
            json!({"name": "x", "pem": [{"certificate": PEM}],
                   "pkcs12": [{"certificate": "b", "passphrase": "p"}]})
            .as_object()
            .cloned()
            .unwrap(),
        );
        assert!(CertificateImport.create(&fw, &mut both).is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (fw, _) = firewall();
        let d = create(
            &CertificateImport,
            &fw,
            json!({"name": "web", "pem": [{"certificate": PEM}]}),
        );
        for _ in 0..2 {
            let mut gone = d.clone();
            CertificateImport.delete(&fw, &mut gone).unwrap();
            assert!(gone.is_gone());
        }
        assert!(read(&CertificateImport, &fw, &d).is_gone());
    }
}
