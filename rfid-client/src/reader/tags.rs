//! Tag access: inventory, memory and field access, kill and lock

use super::{push_optional, RfReader};
use rfid_codec::{CommandReply, ParamNode};
use rfid_core::{RfidError, RfidResult, Tag, TagField};
use std::time::Duration;

/// Width of the lock action and mask bit strings
const LOCK_BITS: usize = 10;

impl RfReader {
    /// Trigger one read cycle of `source`; tags arrive as reports
    ///
    /// `mode` is one of `Single`, `Start` or `Stop`.
    pub async fn trigger_source(&self, source: &str, mode: Option<&str>) -> RfidResult<()> {
        let mut params = vec![ParamNode::leaf("sourceName", source)];
        push_optional(&mut params, "triggerMode", mode);
        self.run("triggerSource", params).await?;
        Ok(())
    }

    /// Inventory of the tags visible at `source`
    ///
    /// A non-zero `duration_ms` keeps the reader reading that long, and the
    /// command deadline grows by the same number of whole seconds.
    pub async fn read_tag_ids(&self, source: Option<&str>, duration_ms: u64) -> RfidResult<Vec<Tag>> {
        let mut params = Vec::new();
        push_optional(&mut params, "sourceName", source);
        let mut timeout = self.config().command_timeout;
        if duration_ms != 0 {
            params.push(ParamNode::leaf("duration", duration_ms));
            timeout += Duration::from_secs(duration_ms / 1000);
        }
        let reply = self.execute_command("readTagIDs", params, timeout).await?;
        Ok(into_tags(reply))
    }

    /// Give a tag a new id
    ///
    /// An `id_length` of 0 leaves the length to the reader.
    pub async fn write_tag_id(
        &self,
        source: Option<&str>,
        tag_id: Option<&str>,
        new_id: &str,
        id_length: u32,
        password: Option<&str>,
    ) -> RfidResult<()> {
        let mut params = Vec::new();
        push_optional(&mut params, "sourceName", source);
        push_optional(&mut params, "tagID", tag_id);
        params.push(ParamNode::leaf("newID", new_id));
        if id_length != 0 {
            params.push(ParamNode::leaf("idLength", id_length));
        }
        push_optional(&mut params, "password", password);
        self.run("writeTagID", params).await?;
        Ok(())
    }

    /// Read memory areas given by bank, start address and length
    pub async fn read_tag_memory(
        &self,
        source: &str,
        tag_id: Option<&str>,
        password: Option<&str>,
        fields: &[TagField],
    ) -> RfidResult<Vec<Tag>> {
        let mut params = target(source, tag_id, password);
        params.extend(fields.iter().map(|f| memory_field(f, false)));
        let reply = self.run("readTagMemory", params).await?;
        Ok(into_tags(reply))
    }

    /// Write the `data` of each field to its memory area
    pub async fn write_tag_memory(
        &self,
        source: &str,
        tag_id: Option<&str>,
        password: Option<&str>,
        fields: &[TagField],
    ) -> RfidResult<Vec<Tag>> {
        let mut params = target(source, tag_id, password);
        params.extend(fields.iter().map(|f| memory_field(f, true)));
        let reply = self.run("writeTagMemory", params).await?;
        Ok(into_tags(reply))
    }

    /// Read fields by their configured names
    pub async fn read_tag_field(
        &self,
        source: &str,
        tag_id: Option<&str>,
        password: Option<&str>,
        field_names: &[&str],
    ) -> RfidResult<Vec<Tag>> {
        let mut params = target(source, tag_id, password);
        params.extend(field_names.iter().map(|name| {
            ParamNode::container("tagField", vec![ParamNode::leaf("fieldName", name)])
        }));
        let reply = self.run("readTagField", params).await?;
        Ok(into_tags(reply))
    }

    pub async fn write_tag_field(
        &self,
        source: &str,
        tag_id: Option<&str>,
        password: Option<&str>,
        fields: &[TagField],
    ) -> RfidResult<Vec<Tag>> {
        let mut params = target(source, tag_id, password);
        params.extend(fields.iter().map(|f| {
            ParamNode::container(
                "tagField",
                vec![
                    ParamNode::leaf("fieldName", &f.name),
                    ParamNode::leaf("data", &f.data),
                ],
            )
        }));
        let reply = self.run("writeTagField", params).await?;
        Ok(into_tags(reply))
    }

    /// Permanently disable a tag
    pub async fn kill_tag(&self, source: &str, tag_id: Option<&str>, password: &str) -> RfidResult<Vec<Tag>> {
        let mut params = Vec::new();
        push_optional(&mut params, "sourceName", Some(source));
        push_optional(&mut params, "tagID", tag_id);
        params.push(ParamNode::leaf("password", password));
        let reply = self.run("killTag", params).await?;
        Ok(into_tags(reply))
    }

    /// Lock memory banks of an EPC Class 1 Gen 2 tag
    ///
    /// `action` and `mask` are the 10 bit lock payload fields.
    pub async fn lock_tag_bank(
        &self,
        source: &str,
        tag_id: Option<&str>,
        action: u32,
        mask: u32,
        password: Option<&str>,
    ) -> RfidResult<Vec<Tag>> {
        let mut params = Vec::new();
        push_optional(&mut params, "sourceName", Some(source));
        push_optional(&mut params, "tagID", tag_id);
        params.push(ParamNode::leaf("lockAction", lock_bits("action", action)?));
        params.push(ParamNode::leaf("lockMask", lock_bits("mask", mask)?));
        params.push(ParamNode::leaf("password", password.unwrap_or_default()));
        let reply = self.run("lockTagBank", params).await?;
        Ok(into_tags(reply))
    }

    /// Hide an NXP tag from readers without the password
    pub async fn nxp_set_read_protect(
        &self,
        source: &str,
        tag_id: Option<&str>,
        password: &str,
    ) -> RfidResult<Vec<Tag>> {
        let params = target(source, tag_id, Some(password));
        let reply = self.run("nXP_SetReadProtect", params).await?;
        Ok(into_tags(reply))
    }

    pub async fn nxp_reset_read_protect(&self, source: &str, password: &str) -> RfidResult<Vec<Tag>> {
        let params = target(source, None, Some(password));
        let reply = self.run("nXP_ResetReadProtect", params).await?;
        Ok(into_tags(reply))
    }
}

/// `sourceName` followed by the optional `tagID` and `password`
fn target(source: &str, tag_id: Option<&str>, password: Option<&str>) -> Vec<ParamNode> {
    let mut params = vec![ParamNode::leaf("sourceName", source)];
    push_optional(&mut params, "tagID", tag_id);
    push_optional(&mut params, "password", password);
    params
}

fn memory_field(field: &TagField, with_data: bool) -> ParamNode {
    let mut children = Vec::with_capacity(4);
    if !field.bank.is_empty() {
        children.push(ParamNode::leaf("bank", &field.bank));
    }
    children.push(ParamNode::leaf("startAddress", &field.address));
    children.push(ParamNode::leaf("dataLength", &field.length));
    if with_data {
        children.push(ParamNode::leaf("data", &field.data));
    }
    ParamNode::container("tagField", children)
}

fn lock_bits(name: &str, value: u32) -> RfidResult<String> {
    if value >> LOCK_BITS != 0 {
        return Err(RfidError::InvalidParameter(format!(
            "lock {} {:#b} is wider than {} bits",
            name, value, LOCK_BITS
        )));
    }
    Ok(format!("{:0width$b}", value, width = LOCK_BITS))
}

fn into_tags(reply: CommandReply) -> Vec<Tag> {
    reply.tag_data.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml(node: &ParamNode) -> String {
        let mut out = String::new();
        node.write_xml(&mut out);
        out
    }

    #[test]
    fn test_lock_bits() {
        assert_eq!(lock_bits("action", 0b10_0000_0011).unwrap(), "1000000011");
        assert_eq!(lock_bits("mask", 1).unwrap(), "0000000001");
        assert!(matches!(
            lock_bits("mask", 1 << 10),
            Err(RfidError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_memory_field_skips_empty_bank() {
        let field = TagField::memory("", "0", "4").with_data("CAFE");
        assert_eq!(
            xml(&memory_field(&field, false)),
            "<tagField><startAddress>0</startAddress><dataLength>4</dataLength></tagField>"
        );
        let field = TagField::memory("3", "0", "2").with_data("CAFE");
        assert_eq!(
            xml(&memory_field(&field, true)),
            "<tagField><bank>3</bank><startAddress>0</startAddress>\
             <dataLength>2</dataLength><data>CAFE</data></tagField>"
        );
    }

    #[test]
    fn test_target_keeps_source_when_empty() {
        let params = target("", Some("E200"), None);
        assert_eq!(
            params,
            vec![ParamNode::leaf("sourceName", ""), ParamNode::leaf("tagID", "E200")]
        );
    }
}
