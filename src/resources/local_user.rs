//! `panos_local_user`: local user database entries.
//!
//! The device keeps only a salted hash, so a password cannot be compared
//! with what is on the device. Instead the hash written at the last apply
//! is kept in `phash`, with the password that produced it in
//! `live_password`. A different hash on the device means the password was
//! changed elsewhere.

use crate::provider::fields::flag;
use crate::provider::lifecycle::ObjectResource;
use crate::provider::scope;
use anyhow::{Context, Result};
use declarative::sensitive::INCORRECT_PASSWORD;
use declarative::{Attribute, Attrs, ResourceData, Schema, identifier};
use panoskit::{Device, LocalUser as User, SHARED};

identifier! {
    pub struct LocalUserId { template, template_stack, vsys, name }
}

pub struct LocalUser;

impl ObjectResource for LocalUser {
    type Entry = User;
    type Id = LocalUserId;

    const TYPE_NAME: &'static str = "panos_local_user";
    const LISTING: &'static str = "panos_local_users";

    fn schema() -> Schema {
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr("password", Attribute::string().required().sensitive())
            .attr(
                "live_password",
                Attribute::string()
                    .computed()
                    .sensitive()
                    .describe("Password that produced phash"),
            )
            .attr("phash", Attribute::string().computed().describe("Password hash"))
            .attr("disabled", flag())
    }

    // Only ask the device for a new hash when the password changed.
    fn load(device: &(dyn Device + 'static), d: &ResourceData) -> Result<User> {
        let password = d.get_string("password");
        let known = d.get_string("phash");
        let phash = if !known.is_empty() && password == d.get_string("live_password") {
            known
        } else {
            device
                .backend()
                .hash_password(&password)
                .context("hashing password")?
        };
        Ok(User {
            name: d.get_string("name"),
            phash,
            disabled: d.get_bool("disabled"),
        })
    }

    fn capture(d: &mut ResourceData, live: &User) -> Result<()> {
        let password = d.get_string("password");
        d.set("live_password", password);
        d.set("phash", live.phash.as_str());
        Ok(())
    }

    fn save(d: &mut ResourceData, user: &User) -> Result<()> {
        let known = d.get_string("phash");
        if !known.is_empty() && known != user.phash {
            log::info!("{}: password changed on the device", user.name);
            d.set("password", INCORRECT_PASSWORD);
            d.set_null("live_password");
        }
        d.set("name", user.name.as_str());
        d.set("phash", user.phash.as_str());
        d.set("disabled", user.disabled);
        Ok(())
    }
}
