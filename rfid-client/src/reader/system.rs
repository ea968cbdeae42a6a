//! Reader management: greetings, configuration, time, IO and status

use super::{push_optional, wire_bool, RfReader};
use chrono::{DateTime, FixedOffset};
use rfid_codec::{CommandReply, ParamNode};
use rfid_core::{
    format_timestamp, parse_timestamp, ConfigId, IoPort, ReaderStatus, RfidError, RfidResult,
};

impl RfReader {
    /// Announce the host and negotiate the protocol version
    ///
    /// Returns the active configuration and the versions the reader
    /// accepted.
    pub async fn host_greetings(
        &self,
        reader_type: &str,
        versions: &[&str],
        reader_mode: Option<&str>,
    ) -> RfidResult<(ConfigId, Vec<String>)> {
        let mut params = vec![ParamNode::leaf("readerType", reader_type)];
        push_optional(&mut params, "readerMode", reader_mode);
        params.push(ParamNode::container(
            "supportedVersions",
            versions
                .iter()
                .map(|v| ParamNode::leaf("version", v))
                .collect(),
        ));

        let reply = self.run("hostGreetings", params).await?;
        reply.require("version")?;
        let config = ConfigId {
            config_id: reply.require("configID")?.to_string(),
            config_type: reply.require("configType")?.to_string(),
        };
        let accepted = reply.params("version").map(str::to_string).collect();
        Ok((config, accepted))
    }

    /// Tell the reader the host is leaving and wait for its answer
    ///
    /// [`RfReader::close`] sends its own goodbye without waiting.
    pub async fn host_goodbye(&self, reader_mode: Option<&str>) -> RfidResult<()> {
        let mut params = Vec::new();
        push_optional(&mut params, "readerMode", reader_mode);
        self.run("hostGoodbye", params).await?;
        Ok(())
    }

    pub async fn start_reader(&self) -> RfidResult<()> {
        self.run("startReader", Vec::new()).await?;
        Ok(())
    }

    pub async fn stop_reader(&self) -> RfidResult<()> {
        self.run("stopReader", Vec::new()).await?;
        Ok(())
    }

    /// Round trip without side effects
    pub async fn heart_beat(&self) -> RfidResult<()> {
        self.run("heartBeat", Vec::new()).await?;
        Ok(())
    }

    /// Change the network settings of the reader
    pub async fn set_ip_config(
        &self,
        ip_address: &str,
        subnet_mask: &str,
        gateway: &str,
        dhcp: bool,
    ) -> RfidResult<()> {
        let params = vec![
            ParamNode::leaf("iPAddress", ip_address),
            ParamNode::leaf("subNetMask", subnet_mask),
            ParamNode::leaf("dHCPEnable", wire_bool(dhcp)),
            ParamNode::leaf("gateway", gateway),
        ];
        self.run("setIPConfig", params).await?;
        Ok(())
    }

    /// Load a configuration document into the reader
    pub async fn set_configuration(&self, config_data: &str) -> RfidResult<ConfigId> {
        let params = vec![ParamNode::leaf(
            "configData",
            format!("<![CDATA[{}]]>", config_data),
        )];
        let reply = self.run_long("setConfiguration", params).await?;
        config_id(&reply)
    }

    /// Active configuration document and its id
    pub async fn get_configuration(&self) -> RfidResult<(ConfigId, String)> {
        let reply = self.run_long("getConfiguration", Vec::new()).await?;
        let config = config_id(&reply)?;
        let data = reply.require("configData")?.to_string();
        Ok((config, data))
    }

    /// Store the active configuration permanently
    pub async fn save_configuration(&self) -> RfidResult<ConfigId> {
        let reply = self.run_long("saveConfiguration", Vec::new()).await?;
        config_id(&reply)
    }

    /// Id and type of the stored configuration
    pub async fn get_config_version(&self) -> RfidResult<ConfigId> {
        let reply = self.run("getConfigVersion", Vec::new()).await?;
        Ok(ConfigId {
            config_id: reply.require("configID")?.to_string(),
            config_type: reply.require("configType")?.to_string(),
        })
    }

    pub async fn set_time(&self, time: &DateTime<FixedOffset>) -> RfidResult<()> {
        let params = vec![ParamNode::leaf("utcTime", format_timestamp(time))];
        self.run("setTime", params).await?;
        Ok(())
    }

    pub async fn get_time(&self) -> RfidResult<DateTime<FixedOffset>> {
        let reply = self.run("getTime", Vec::new()).await?;
        let text = reply.require("utcTime")?;
        parse_timestamp(text).ok_or_else(|| {
            RfidError::InvalidReply(format!("Command getTime returned invalid time {}", text))
        })
    }

    /// Set the digital outputs
    ///
    /// `out_value` is a binary digit string, most significant bit first.
    pub async fn set_io(&self, out_value: &str) -> RfidResult<()> {
        if out_value.is_empty() || !out_value.chars().all(|c| c == '0' || c == '1') {
            return Err(RfidError::InvalidParameter(format!(
                "outValue {} is not a binary string",
                out_value
            )));
        }
        self.run("setIO", vec![ParamNode::leaf("outValue", out_value)])
            .await?;
        Ok(())
    }

    /// State of the digital inputs and outputs
    pub async fn get_io(&self) -> RfidResult<IoPort> {
        let reply = self.run("getIO", Vec::new()).await?;
        IoPort::from_binary(reply.require("inValue")?, reply.require("outValue")?)
    }

    pub async fn reset_reader(&self, reset_type: &str) -> RfidResult<()> {
        self.run_long("resetReader", vec![ParamNode::leaf("resetType", reset_type)])
            .await?;
        Ok(())
    }

    pub async fn get_reader_status(&self) -> RfidResult<ReaderStatus> {
        let reply = self.run("getReaderStatus", Vec::new()).await?;
        Ok(ReaderStatus::from_pairs(
            reply
                .parameters
                .iter()
                .filter(|p| !p.is_container)
                .map(|p| (p.key.as_str(), p.value.as_str())),
        ))
    }

    /// Names of all read points, in reader order
    pub async fn get_all_sources(&self) -> RfidResult<Vec<String>> {
        let reply = self.run("getAllSources", Vec::new()).await?;
        let mut sources = Vec::with_capacity(reply.parameters.len());
        for param in &reply.parameters {
            if param.key != "sourceName" {
                return Err(RfidError::MissingParameter(format!(
                    "Command getAllSources returned {} instead of sourceName",
                    param.key
                )));
            }
            sources.push(param.value.clone());
        }
        Ok(sources)
    }

    /// Pass raw bytes to the reader firmware and return its raw answer
    pub async fn send_command(&self, command: &[u8]) -> RfidResult<Vec<u8>> {
        let params = vec![ParamNode::leaf("byteCommand", hex::encode_upper(command))];
        let reply = self.run("sendCommand", params).await?;
        let text = reply.require("byteReply")?;
        hex::decode(text).map_err(|e| {
            RfidError::InvalidReply(format!("byteReply {} is not hex: {}", text, e))
        })
    }
}

fn config_id(reply: &CommandReply) -> RfidResult<ConfigId> {
    Ok(ConfigId {
        config_id: reply.require("configID")?.to_string(),
        config_type: reply.param("configType").unwrap_or_default().to_string(),
    })
}
