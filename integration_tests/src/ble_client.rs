//! BLE client for the calculator peripheral.
//!
//! The service UUID changes every boot, so the client scans for the UUID the
//! firmware logged and picks the characteristics by their properties.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

/// BLE client for the calculator service.
pub struct CalcClient {
    peripheral: Peripheral,
    write_char: Characteristic,
    notify_char: Characteristic,
    /// Notified values, oldest first
    notifications: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CalcClient {
    /// Scan for a peripheral advertising `service` and connect.
    pub async fn connect_by_service(service: Uuid, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        adapter
            .start_scan(ScanFilter {
                services: vec![service],
            })
            .await?;

        let peripheral = Self::find_device_by_service(&adapter, service, scan_timeout).await?;

        adapter.stop_scan().await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let in_service = |flag: CharPropFlags| {
            characteristics
                .iter()
                .find(|c| c.service_uuid == service && c.properties.contains(flag))
                .cloned()
        };

        let write_char = in_service(CharPropFlags::WRITE)
            .ok_or_else(|| anyhow!("Write characteristic not found"))?;
        let notify_char = in_service(CharPropFlags::NOTIFY)
            .ok_or_else(|| anyhow!("Notify characteristic not found"))?;

        peripheral.subscribe(&notify_char).await?;

        let notifications = Arc::new(Mutex::new(Vec::new()));

        // Spawn notification handler
        let buffer = notifications.clone();
        let peripheral_clone = peripheral.clone();
        let notify_uuid = notify_char.uuid;
        tokio::spawn(async move {
            let mut stream = match peripheral_clone.notifications().await {
                Ok(s) => s,
                Err(_) => return,
            };

            while let Some(data) = stream.next().await {
                if data.uuid == notify_uuid {
                    buffer.lock().await.push(data.value);
                }
            }
        });

        Ok(Self {
            peripheral,
            write_char,
            notify_char,
            notifications,
        })
    }

    /// Find a device advertising `service` within the scan timeout.
    async fn find_device_by_service(
        adapter: &Adapter,
        service: Uuid,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            for peripheral in adapter.peripherals().await? {
                if let Some(props) = peripheral.properties().await? {
                    if props.services.contains(&service) {
                        return Ok(peripheral);
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!("No device advertising {} within timeout", service))
    }

    /// Write an expression (with response) and wait for the notified result.
    pub async fn evaluate(&self, expression: &[u8], response_timeout: Duration) -> Result<String> {
        self.clear_buffer().await;

        self.peripheral
            .write(&self.write_char, expression, WriteType::WithResponse)
            .await?;

        self.wait_for_notification(response_timeout).await
    }

    /// Read the Notify characteristic's current value.
    pub async fn read_result(&self) -> Result<String> {
        let value = self.peripheral.read(&self.notify_char).await?;
        Ok(String::from_utf8(value)?)
    }

    /// Attempt to read the Write characteristic (should be refused).
    pub async fn read_write_characteristic(&self) -> Result<Vec<u8>> {
        Ok(self.peripheral.read(&self.write_char).await?)
    }

    /// Wait for the next notification with timeout.
    pub async fn wait_for_notification(&self, response_timeout: Duration) -> Result<String> {
        let result = timeout(response_timeout, async {
            loop {
                let mut buf = self.notifications.lock().await;
                if !buf.is_empty() {
                    let value = buf.remove(0);
                    return value;
                }
                drop(buf);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match result {
            Ok(value) => Ok(String::from_utf8(value)?),
            Err(_) => Err(anyhow!("Timeout waiting for notification")),
        }
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        self.peripheral.unsubscribe(&self.notify_char).await?;
        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// Clear any pending notifications.
    pub async fn clear_buffer(&self) {
        self.notifications.lock().await.clear();
    }
}
