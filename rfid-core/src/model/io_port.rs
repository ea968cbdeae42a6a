use crate::error::{RfidError, RfidResult};
use serde::{Deserialize, Serialize};

/// Maximum number of digital ports per direction
pub const MAX_IO_PORTS: usize = 8;

/// State of the reader's digital inputs and outputs
///
/// Index 0 is port 0. On the wire a port set is a string of binary digits
/// with the highest port first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoPort {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
}

impl IoPort {
    /// Create a port set with all levels low
    ///
    /// Counts above [`MAX_IO_PORTS`] are clamped.
    pub fn new(input_count: usize, output_count: usize) -> Self {
        Self {
            inputs: vec![false; input_count.min(MAX_IO_PORTS)],
            outputs: vec![false; output_count.min(MAX_IO_PORTS)],
        }
    }

    /// Build from the binary strings returned by `getIO`
    pub fn from_binary(in_value: &str, out_value: &str) -> RfidResult<Self> {
        let mut port = Self::new(in_value.len(), out_value.len());
        if !in_value.is_empty() {
            port.set_in_value(parse_binary("inValue", in_value)?);
        }
        if !out_value.is_empty() {
            port.set_out_value(parse_binary("outValue", out_value)?);
        }
        Ok(port)
    }

    pub fn contains_ports(&self) -> bool {
        !self.inputs.is_empty() || !self.outputs.is_empty()
    }

    pub fn in_value(&self) -> u16 {
        to_value(&self.inputs)
    }

    pub fn out_value(&self) -> u16 {
        to_value(&self.outputs)
    }

    pub fn set_in_value(&mut self, value: u16) {
        from_value(&mut self.inputs, value);
    }

    pub fn set_out_value(&mut self, value: u16) {
        from_value(&mut self.outputs, value);
    }
}

fn parse_binary(key: &str, text: &str) -> RfidResult<u16> {
    u16::from_str_radix(text, 2).map_err(|e| {
        RfidError::InvalidParameter(format!("Invalid value for {}: '{}' ({})", key, text, e))
    })
}

fn to_value(bits: &[bool]) -> u16 {
    bits.iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .fold(0u16, |acc, (i, _)| acc | (1 << i))
}

fn from_value(bits: &mut [bool], value: u16) {
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = value & (1 << i) != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_binary() {
        let port = IoPort::from_binary("0101", "10").unwrap();
        assert_eq!(port.inputs, vec![true, false, true, false]);
        assert_eq!(port.outputs, vec![false, true]);
        assert_eq!(port.in_value(), 5);
        assert_eq!(port.out_value(), 2);
    }

    #[test]
    fn test_clamps_port_count() {
        let port = IoPort::new(12, 0);
        assert_eq!(port.inputs.len(), MAX_IO_PORTS);
        assert!(port.contains_ports());
        assert!(!IoPort::new(0, 0).contains_ports());
    }

    #[test]
    fn test_rejects_non_binary() {
        let err = IoPort::from_binary("012", "").unwrap_err();
        assert!(matches!(err, RfidError::InvalidParameter(_)));
    }
}
