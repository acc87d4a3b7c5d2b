//! `panos_audit_comment_history`: audit comments attached to a policy rule.

use anyhow::{Context, Result, anyhow};
use declarative::{
    Attribute, Attrs, Block, DataSource, Identifier, ResourceData, Schema, identifier,
};
use panoskit::{
    AuditQuery, Container, DEFAULT_VSYS, Device, Direction, Family, Kind, Location, SHARED, Scope,
};

identifier! {
    pub struct AuditHistoryId { rule_type, vsys, device_group, rulebase, name }
}

const RULE_TYPES: &[&str] = &["security", "nat", "pbf", "decryption"];

pub struct AuditCommentHistory;

fn rule_kind(rule_type: &str) -> Result<Kind> {
    match rule_type {
        "" | "security" => Ok(Kind::SecurityRule),
        "nat" => Ok(Kind::NatRule),
        "pbf" => Ok(Kind::PbfRule),
        "decryption" => Ok(Kind::DecryptionRule),
        other => Err(anyhow!("unknown rule type {other:?}")),
    }
}

fn count(d: &ResourceData, key: &str) -> Result<usize> {
    usize::try_from(d.get_int(key)).with_context(|| format!("{key} must not be negative"))
}

fn comment_schema() -> Schema {
    Schema::new()
        .attr("admin", Attribute::string().computed())
        .attr("comment", Attribute::string().computed())
        .attr("config_version", Attribute::int().computed())
        .attr("time_generated", Attribute::string().computed())
}

impl DataSource<dyn Device> for AuditCommentHistory {
    fn type_name(&self) -> &'static str {
        "panos_audit_comment_history"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr(
                "rule_type",
                Attribute::string().optional().default("security").one_of(RULE_TYPES),
            )
            .attr("vsys", Attribute::string().optional().default(DEFAULT_VSYS))
            .attr("device_group", Attribute::string().optional().default(SHARED))
            .attr(
                "rulebase",
                Attribute::string()
                    .optional()
                    .one_of(&["pre-rulebase", "post-rulebase"])
                    .describe("Panorama rulebase; pre-rulebase when unset"),
            )
            .attr("name", Attribute::string().required().describe("Rule name"))
            .attr("nlogs", Attribute::int().optional().default(100))
            .attr("skip", Attribute::int().optional().default(0))
            .attr(
                "direction",
                Attribute::string()
                    .optional()
                    .default("backward")
                    .one_of(&["forward", "backward"]),
            )
            .attr("comments", Attribute::block(comment_schema()).computed())
    }

    fn read(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = AuditHistoryId::from_data(d);
        id.validate()?;
        let kind = rule_kind(&id.rule_type)?;
        let direction = d.get_string("direction");
        let query = AuditQuery {
            nlogs: count(d, "nlogs")?,
            skip: count(d, "skip")?,
            direction: Direction::parse(&direction)
                .ok_or_else(|| anyhow!("unknown direction {direction:?}"))?,
        };

        let scope = Scope {
            vsys: id.vsys.clone(),
            device_group: id.device_group.clone(),
            ..Scope::default()
        };
        let location = match device.locate(Family::Rulebase, &scope)? {
            Location::DeviceGroupRulebase { device_group, .. } if !id.rulebase.is_empty() => {
                Location::DeviceGroupRulebase {
                    device_group,
                    rulebase: id.rulebase.clone(),
                }
            }
            location => location,
        };
        let rules = Container::new(location, kind);

        log::debug!("audit comments of {} {} in {rules}", kind.label(), id.name);
        let comments = device
            .backend()
            .audit_comments(&rules, &id.name, &query)
            .with_context(|| format!("reading audit comments of {}", id.name))?;

        d.set_blocks(
            "comments",
            comments
                .into_iter()
                .map(|c| {
                    Block::new()
                        .with("admin", c.admin)
                        .with("comment", c.comment)
                        .with("config_version", c.config_version)
                        .with("time_generated", c.time_generated)
                })
                .collect(),
        );
        d.set_id(id.encode());
        Ok(())
    }
}
