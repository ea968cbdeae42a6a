//! Air protocol and antenna configuration

use super::RfReader;
use rfid_codec::{ParamNode, ReplyParameter};
use rfid_core::{Antenna, AntennaSet, RfidError, RfidResult, ANTENNA_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of entries a `getProtocolConfig` reply must carry
const PROTOCOL_CONFIG_ENTRIES: usize = 6;

/// Air protocol settings written by `setProtocolConfig`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Initial Q of the anticollision, 0..=15
    pub initial_q: u32,
    /// Communication profile, 0..=11
    pub profile: u32,
    /// Channel numbers, comma separated
    pub channels: String,
    /// Air command retries, 0..=255
    pub retry: u32,
    /// Fixed tag id length in bits, a multiple of 16 up to 496; 0 for none
    pub id_length: u32,
    /// Power boost on write commands, 0..=12
    pub write_boost: u32,
}

impl ProtocolConfig {
    /// Check every value against the range the reader accepts
    pub fn validate(&self) -> RfidResult<()> {
        check_range("initialQ", self.initial_q, 15)?;
        check_range("profile", self.profile, 11)?;
        check_range("retry", self.retry, 255)?;
        check_range("writeBoost", self.write_boost, 12)?;
        if self.id_length > 496 || self.id_length % 16 != 0 {
            return Err(RfidError::InvalidParameter(format!(
                "idLength {} is not a multiple of 16 up to 496",
                self.id_length
            )));
        }
        Ok(())
    }

    fn to_params(&self) -> Vec<ParamNode> {
        vec![
            ParamNode::leaf("initialQ", self.initial_q),
            ParamNode::leaf("profile", self.profile),
            ParamNode::leaf("channels", &self.channels),
            ParamNode::leaf("retry", self.retry),
            ParamNode::leaf("idLength", self.id_length),
            ParamNode::leaf("writeBoost", self.write_boost),
        ]
    }
}

fn check_range(name: &str, value: u32, max: u32) -> RfidResult<()> {
    if value > max {
        return Err(RfidError::InvalidParameter(format!(
            "{} {} is out of range 0..={}",
            name, value, max
        )));
    }
    Ok(())
}

impl RfReader {
    pub async fn set_protocol_config(&self, config: &ProtocolConfig) -> RfidResult<()> {
        config.validate()?;
        self.run("setProtocolConfig", config.to_params()).await?;
        Ok(())
    }

    /// Air protocol settings, keyed by their wire names
    pub async fn get_protocol_config(&self) -> RfidResult<BTreeMap<String, String>> {
        let reply = self.run("getProtocolConfig", Vec::new()).await?;
        let entries: BTreeMap<String, String> = reply
            .parameters
            .iter()
            .filter(|p| !p.is_container)
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        if entries.len() != PROTOCOL_CONFIG_ENTRIES {
            return Err(RfidError::MissingParameter(format!(
                "Command getProtocolConfig returned {} parameters instead of {}",
                entries.len(),
                PROTOCOL_CONFIG_ENTRIES
            )));
        }
        Ok(entries)
    }

    /// Write the antennas selected by `mask`; bit 0 selects `Antenna01`
    pub async fn set_antenna_config(&self, antennas: &AntennaSet, mask: u16) -> RfidResult<()> {
        let params: Vec<ParamNode> = antennas
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(i, antenna)| antenna_node(i, antenna))
            .collect();
        if params.is_empty() {
            return Err(RfidError::InvalidParameter(format!(
                "antenna mask {:#06b} selects no antenna",
                mask
            )));
        }
        self.run("setAntennaConfig", params).await?;
        Ok(())
    }

    /// Antenna settings as the reader reports them
    ///
    /// Antennas the reply leaves out keep their default values.
    pub async fn get_antenna_config(&self) -> RfidResult<AntennaSet> {
        let reply = self.run("getAntennaConfig", Vec::new()).await?;
        if reply.parameters.first().is_some_and(|p| !p.is_container) {
            return Err(RfidError::InvalidParameter(
                "getAntennaConfig returned a value outside of an antenna block".to_string(),
            ));
        }

        let groups = reply.groups("antenna");
        if groups.len() > ANTENNA_COUNT {
            return Err(RfidError::InvalidParameter(format!(
                "getAntennaConfig returned {} antennas, at most {} exist",
                groups.len(),
                ANTENNA_COUNT
            )));
        }

        let mut set = AntennaSet::default();
        for (index, group) in groups.iter().enumerate() {
            set.antennas[index] = read_antenna(index, group)?;
        }
        Ok(set)
    }
}

fn antenna_node(index: usize, antenna: &Antenna) -> ParamNode {
    let name = if antenna.name.is_empty() {
        AntennaSet::antenna_name(index)
    } else {
        antenna.name.clone()
    };
    ParamNode::container(
        "antenna",
        vec![
            ParamNode::leaf("antennaName", name),
            ParamNode::leaf("power", antenna.power),
            ParamNode::leaf("cableLoss", antenna.cable_loss),
            ParamNode::leaf("gain", antenna.gain),
            ParamNode::leaf("rSSIThreshold", antenna.rssi_threshold),
        ],
    )
}

/// Decode the block of the antenna at `index`
fn read_antenna(index: usize, group: &[&ReplyParameter]) -> RfidResult<Antenna> {
    let value = |key: &str| {
        group
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
            .ok_or_else(|| {
                RfidError::MissingParameter(format!(
                    "Command getAntennaConfig returned antenna {} without {}",
                    index + 1,
                    key
                ))
            })
    };

    let expected = AntennaSet::antenna_name(index);
    if let Ok(name) = value("antennaName") {
        if name != expected {
            return Err(RfidError::InvalidParameter(format!(
                "antenna block {} is named {:?}, expected {}",
                index + 1,
                name,
                expected
            )));
        }
    }

    Ok(Antenna {
        name: expected,
        power: value("power")?.parse().unwrap_or(0),
        cable_loss: parse_value("cableLoss", value("cableLoss")?)?,
        gain: parse_value("gain", value("gain")?)?,
        rssi_threshold: parse_value("rSSIThreshold", value("rSSIThreshold")?)?,
    })
}

fn parse_value<T: std::str::FromStr>(key: &str, text: &str) -> RfidResult<T> {
    text.trim()
        .parse()
        .map_err(|_| RfidError::InvalidParameter(format!("{} {:?} is not a number", key, text)))
}
