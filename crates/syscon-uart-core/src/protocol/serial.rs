//! Serial port handling
//!
//! Finds and opens the UART adapter wired to the syscon.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use tracing::debug;

use super::{ProtocolError, SessionConfig};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                (Some(usb_info.vid), Some(usb_info.pid), usb_info.product)
            }
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// USB-serial adapters (ttyUSB*) first, then CDC devices (ttyACM*), then
/// everything else, each group ordered by its numeric suffix.
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in [(0u8, "ttyUSB"), (1, "ttyACM")] {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank, num, basename.to_string());
        }
    }
    (2, 0, basename.to_string())
}

/// List available serial ports in a stable order
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

/// Open and configure the port named in `config`.
///
/// The baud rate follows the wire variant; framing is 8N1 without flow
/// control. Buffers are cleared so the first answer is not polluted by
/// boot noise.
pub fn open_port(config: &SessionConfig) -> Result<Box<dyn SerialPort>, ProtocolError> {
    if config.port_name.is_empty() {
        return Err(ProtocolError::InvalidConfig(
            "no serial port configured".to_string(),
        ));
    }

    debug!(
        port = %config.port_name,
        baud = config.baud_rate(),
        variant = %config.variant,
        "opening serial port"
    );

    let port = serialport::new(&config.port_name, config.baud_rate())
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.read_timeout())
        .open()?;

    port.clear(serialport::ClearBuffer::All)?;
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // Only checks that enumeration does not panic
        let ports = list_ports();
        for port in &ports {
            println!("Found port: {} - {:?}", port.name, port.product);
        }
    }

    #[test]
    fn test_port_sorting() {
        let mut names = vec![
            "/dev/ttyACM0",
            "/dev/ttyUSB10",
            "/dev/someport",
            "/dev/ttyUSB1",
            "/dev/ttyUSB0",
        ];
        names.sort_by_key(|n| port_sort_key(n));

        assert_eq!(
            names,
            vec![
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/ttyUSB10",
                "/dev/ttyACM0",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_open_without_port_name() {
        let config = SessionConfig::default();
        assert!(matches!(
            open_port(&config),
            Err(ProtocolError::InvalidConfig(_))
        ));
    }
}
