use serde::Serialize;

/// Receive and transmit counters of one interface, as reported in `/proc/<pid>/net/dev`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NetworkCounters {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Packets received.
    pub rx_packets: u64,
    /// Receive errors.
    pub rx_errs: u64,
    /// Dropped packets while receiving.
    pub rx_drop: u64,
    /// FIFO buffer errors while receiving.
    pub rx_fifo: u64,
    /// Frame alignment errors while receiving.
    pub rx_frame: u64,
    /// Compressed packets received.
    pub rx_compressed: u64,
    /// Multicast packets received.
    pub rx_multicast: u64,

    /// Bytes transmitted.
    pub tx_bytes: u64,
    /// Packets transmitted.
    pub tx_packets: u64,
    /// Transmit errors.
    pub tx_errs: u64,
    /// Dropped packets while transmitting.
    pub tx_drop: u64,
    /// FIFO buffer errors while transmitting.
    pub tx_fifo: u64,
    /// Collisions detected while transmitting.
    pub tx_colls: u64,
    /// Carrier loss errors while transmitting.
    pub tx_carrier: u64,
    /// Compressed packets transmitted.
    pub tx_compressed: u64,
}

impl std::ops::AddAssign<&NetworkCounters> for NetworkCounters {
    fn add_assign(&mut self, rhs: &NetworkCounters) {
        self.rx_bytes = self.rx_bytes.saturating_add(rhs.rx_bytes);
        self.rx_packets = self.rx_packets.saturating_add(rhs.rx_packets);
        self.rx_errs = self.rx_errs.saturating_add(rhs.rx_errs);
        self.rx_drop = self.rx_drop.saturating_add(rhs.rx_drop);
        self.rx_fifo = self.rx_fifo.saturating_add(rhs.rx_fifo);
        self.rx_frame = self.rx_frame.saturating_add(rhs.rx_frame);
        self.rx_compressed = self.rx_compressed.saturating_add(rhs.rx_compressed);
        self.rx_multicast = self.rx_multicast.saturating_add(rhs.rx_multicast);
        self.tx_bytes = self.tx_bytes.saturating_add(rhs.tx_bytes);
        self.tx_packets = self.tx_packets.saturating_add(rhs.tx_packets);
        self.tx_errs = self.tx_errs.saturating_add(rhs.tx_errs);
        self.tx_drop = self.tx_drop.saturating_add(rhs.tx_drop);
        self.tx_fifo = self.tx_fifo.saturating_add(rhs.tx_fifo);
        self.tx_colls = self.tx_colls.saturating_add(rhs.tx_colls);
        self.tx_carrier = self.tx_carrier.saturating_add(rhs.tx_carrier);
        self.tx_compressed = self.tx_compressed.saturating_add(rhs.tx_compressed);
    }
}

impl NetworkCounters {
    pub fn total_bytes(&self) -> u64 {
        self.rx_bytes.saturating_add(self.tx_bytes)
    }

    pub fn total_packets(&self) -> u64 {
        self.rx_packets.saturating_add(self.tx_packets)
    }

    pub fn total_errors(&self) -> u64 {
        self.rx_errs.saturating_add(self.tx_errs)
    }

    pub fn total_drops(&self) -> u64 {
        self.rx_drop.saturating_add(self.tx_drop)
    }
}

/// A named interface and its counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub name: String,
    #[serde(flatten)]
    pub counters: NetworkCounters,
}

const LOOPBACK_INTERFACE: &str = "lo";

/// Splits a `/proc/net/dev` data line into the interface name and its value tokens.
///
/// # Returns
///
/// `None` if the line has no `:` separator.
fn parse_interface_line(line: &str) -> Option<(&str, impl Iterator<Item = &str>)> {
    let (iface, data) = line.trim().split_once(':')?;
    Some((iface.trim(), data.split_whitespace()))
}

/// Builds counters from the first 16 value tokens of a line.
///
/// # Returns
///
/// `None` if fewer than 16 tokens are present or any of them is not an unsigned integer.
fn counters_from_fields<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<NetworkCounters> {
    let mut next = || fields.next()?.parse::<u64>().ok();
    Some(NetworkCounters {
        rx_bytes: next()?,
        rx_packets: next()?,
        rx_errs: next()?,
        rx_drop: next()?,
        rx_fifo: next()?,
        rx_frame: next()?,
        rx_compressed: next()?,
        rx_multicast: next()?,
        tx_bytes: next()?,
        tx_packets: next()?,
        tx_errs: next()?,
        tx_drop: next()?,
        tx_fifo: next()?,
        tx_colls: next()?,
        tx_carrier: next()?,
        tx_compressed: next()?,
    })
}

/// Per-interface network statistics of a process's network namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub pid: u32,
    pub interfaces: Vec<NetworkInterface>,
}

impl NetworkStats {
    /// Parses the content of `/proc/<pid>/net/dev`.
    ///
    /// The first two lines are headers and always skipped. A data line with fewer than 16
    /// counters, or with any counter that fails to parse, is skipped without affecting the
    /// other interfaces.
    pub fn parse(pid: u32, content: &str) -> Self {
        let interfaces = content
            .lines()
            .skip(2)
            .filter_map(|line| {
                let (name, fields) = parse_interface_line(line)?;
                match counters_from_fields(fields) {
                    Some(counters) => Some(NetworkInterface {
                        name: name.to_string(),
                        counters,
                    }),
                    None => {
                        log::debug!("skipping malformed net/dev line for `{name}`");
                        None
                    }
                }
            })
            .collect();

        Self { pid, interfaces }
    }

    pub fn get_interface_by_name(&self, name: &str) -> Option<&NetworkInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Sum of the counters over every interface.
    pub fn totals(&self) -> NetworkCounters {
        let mut totals = NetworkCounters::default();
        for iface in &self.interfaces {
            totals += &iface.counters;
        }
        totals
    }

    pub fn total_rx_bytes(&self) -> u64 {
        self.totals().rx_bytes
    }

    pub fn total_tx_bytes(&self) -> u64 {
        self.totals().tx_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.totals().total_bytes()
    }

    pub fn total_rx_packets(&self) -> u64 {
        self.totals().rx_packets
    }

    pub fn total_tx_packets(&self) -> u64 {
        self.totals().tx_packets
    }

    pub fn total_packets(&self) -> u64 {
        self.totals().total_packets()
    }

    pub fn total_errors(&self) -> u64 {
        self.totals().total_errors()
    }

    pub fn total_drops(&self) -> u64 {
        self.totals().total_drops()
    }

    /// Every interface except loopback.
    pub fn non_loopback_interfaces(&self) -> impl Iterator<Item = &NetworkInterface> {
        self.interfaces
            .iter()
            .filter(|i| i.name != LOOPBACK_INTERFACE)
    }

    /// Received plus transmitted bytes over the non-loopback interfaces.
    pub fn external_traffic_bytes(&self) -> u64 {
        self.non_loopback_interfaces()
            .map(|i| i.counters.total_bytes())
            .fold(0, u64::saturating_add)
    }
}
