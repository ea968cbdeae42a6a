use serde::{Deserialize, Serialize};

/// Number of antenna ports on the reader
pub const ANTENNA_COUNT: usize = 4;

/// Configuration of one antenna port
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    pub name: String,
    pub power: u16,
    pub cable_loss: f32,
    pub gain: f32,
    pub rssi_threshold: u16,
}

/// The full set of antenna ports, `Antenna01` to `Antenna04`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaSet {
    pub antennas: [Antenna; ANTENNA_COUNT],
}

impl AntennaSet {
    /// Wire name of the antenna at `index` (zero based)
    pub fn antenna_name(index: usize) -> String {
        format!("Antenna{:02}", index + 1)
    }

    /// Index of a wire antenna name, `None` if it is not one of ours
    pub fn index_of(name: &str) -> Option<usize> {
        (0..ANTENNA_COUNT).find(|&i| Self::antenna_name(i) == name)
    }

    pub fn get(&self, index: usize) -> Option<&Antenna> {
        self.antennas.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Antenna> {
        self.antennas.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Antenna> {
        self.antennas.iter()
    }
}

impl Default for AntennaSet {
    fn default() -> Self {
        Self {
            antennas: std::array::from_fn(|i| Antenna {
                name: Self::antenna_name(i),
                ..Default::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let set = AntennaSet::default();
        let names: Vec<_> = set.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Antenna01", "Antenna02", "Antenna03", "Antenna04"]);
    }

    #[test]
    fn test_index_of() {
        assert_eq!(AntennaSet::index_of("Antenna03"), Some(2));
        assert_eq!(AntennaSet::index_of("Antenna05"), None);
        assert_eq!(AntennaSet::index_of("antenna01"), None);
    }
}
