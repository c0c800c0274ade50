//! BLE task for the calculator peripheral
//!
//! Owns the trouble-host stack and drives the engine from it:
//! 1. Builds the attribute table from the boot-time profile
//! 2. Runs the readiness gate and registers the service
//! 3. Advertises whenever the advertiser controller asks for it
//! 4. Feeds GATT events of the connected central into the GATT server and
//!    plays back the notifications/responses it queues

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use trouble_host::prelude::*;

use crate::advertise::{AdvertiseData, AdvertiseError, AdvertiserController, SessionId};
use crate::ble::service::{build_table, CalcAttributeServer, CalcService, CONNECTIONS_MAX};
use crate::ble::transport::{
    att_error, AdvertiseCommand, AdvertiseSignal, ChannelTransport, EspRadioPlatform, Outbound,
    OutboundChannel, SignalAdvertisingBackend,
};
use crate::config::advertise::{MAX_PAYLOAD_LEN, RETRY_DELAY_MS};
use crate::gatt::{DeviceAddress, GattServer, GattStatus, ProfileIds};
use crate::readiness::ReadinessGate;

/// Number of L2CAP channels (Signal + ATT)
const L2CAP_CHANNELS_MAX: usize = 2;

type CalcServer<'a> = GattServer<CriticalSectionRawMutex, ChannelTransport<'a>, ()>;
type CalcAdvertiser<'a> =
    AdvertiserController<CriticalSectionRawMutex, SignalAdvertisingBackend<'a>, ()>;

/// Main BLE task. Returns only if the radio is unusable.
pub async fn ble_task<C: Controller>(controller: C, profile: ProfileIds, address: [u8; 6]) {
    log::info!("BLE: Service {}", profile.service);

    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();
    let stack = trouble_host::new(controller, &mut resources).set_random_address(Address::random(address));
    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    let (table, service) = build_table(&profile);
    let attributes = CalcAttributeServer::new(table);

    let outbound = OutboundChannel::new();
    let commands = AdvertiseSignal::new();
    let server: CalcServer = GattServer::new(profile, ChannelTransport::new(profile.service, &outbound), ());
    let advertiser: CalcAdvertiser = AdvertiserController::new(
        AdvertiseData::service_only(profile.service),
        SignalAdvertisingBackend::new(&commands),
        (),
    );

    let ready = match ReadinessGate::check(&mut EspRadioPlatform, &()).await {
        Ok(ready) => ready,
        Err(error) => {
            log::error!("BLE: {}", error.reason());
            return;
        }
    };

    if let Err(error) = server.register_service().await {
        log::error!("BLE: {}", error);
        return;
    }

    let runner_task = async {
        loop {
            if let Err(e) = runner.run().await {
                log::warn!("BLE: Runner error: {:?}", e);
            }
        }
    };

    let peripheral_task = async {
        let _ = advertiser.start(&ready);

        loop {
            let session = match commands.wait().await {
                AdvertiseCommand::Start(session) => session,
                // Nothing running, nothing to stop
                AdvertiseCommand::Stop(_) => continue,
            };

            let acceptor = match advertise(&mut peripheral, &advertiser, &server, &commands, session).await {
                Advertised::Connected(acceptor) => acceptor,
                Advertised::Stopped => continue,
                Advertised::Failed => {
                    Timer::after(Duration::from_millis(RETRY_DELAY_MS)).await;
                    let _ = advertiser.start(&ready);
                    continue;
                }
            };

            // One connection at a time: advertising ends while it is served
            advertiser.stop();
            server.advertising_stopped().await;

            match acceptor.with_attribute_server(&attributes) {
                Ok(conn) => serve(&conn, &attributes, &service, &profile, &server, &outbound).await,
                Err(e) => log::warn!("BLE: Attach failed: {:?}", e),
            }

            let _ = advertiser.start(&ready);
        }
    };

    select(runner_task, peripheral_task).await;
}

/// How an advertising session ended
enum Advertised<'values> {
    Connected(Connection<'values, DefaultPacketPool>),
    /// Stopped through the controller
    Stopped,
    /// The radio refused or dropped the session; advertise again
    Failed,
}

/// Advertise for `session` until a central connects or the session is
/// stopped. Reports the start outcome to the controller.
async fn advertise<'values, C: Controller>(
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    advertiser: &CalcAdvertiser<'_>,
    server: &CalcServer<'_>,
    commands: &AdvertiseSignal,
    session: SessionId,
) -> Advertised<'values> {
    let mut adv_data = [0u8; MAX_PAYLOAD_LEN];
    let len = match advertiser.data().encode(&mut adv_data) {
        Ok(len) => len,
        Err(error) => {
            advertiser.on_start_failure(session, error);
            return Advertised::Failed;
        }
    };

    let settings = *advertiser.settings();
    let interval = Duration::from_millis(settings.mode.interval_ms().into());
    let params = AdvertisementParameters {
        interval_min: interval,
        interval_max: interval,
        ..Default::default()
    };

    let handle = match peripheral
        .advertise(
            &params,
            Advertisement::ConnectableScannableUndirected {
                adv_data: &adv_data[..len],
                scan_data: &[],
            },
        )
        .await
    {
        Ok(handle) => handle,
        Err(e) => {
            log::warn!("BLE: Advertise error: {:?}", e);
            advertiser.on_start_failure(session, AdvertiseError::InternalError);
            return Advertised::Failed;
        }
    };

    advertiser.on_start_success(session, settings);
    let _ = server.advertising_started().await;

    let stopped = async {
        loop {
            if let AdvertiseCommand::Stop(stopped) = commands.wait().await {
                if stopped == session {
                    break;
                }
            }
        }
    };

    match select(handle.accept(), stopped).await {
        Either::First(Ok(acceptor)) => Advertised::Connected(acceptor),
        Either::First(Err(e)) => {
            log::warn!("BLE: Accept error: {:?}", e);
            advertiser.stop();
            // Drop the Stop the controller just queued for this session
            commands.reset();
            server.advertising_stopped().await;
            Advertised::Failed
        }
        Either::Second(()) => {
            server.advertising_stopped().await;
            Advertised::Stopped
        }
    }
}

/// Serve one connected central until it disconnects
async fn serve<P: PacketPool>(
    conn: &GattConnection<'_, '_, P>,
    attributes: &CalcAttributeServer,
    service: &CalcService,
    profile: &ProfileIds,
    server: &CalcServer<'_>,
    outbound: &OutboundChannel,
) {
    let device = DeviceAddress::new(conn.raw().peer_address().into_inner());
    server.on_connection_state_change(device, true).await;

    let characteristic_for = |handle: u16| {
        if handle == service.write.handle {
            Some(profile.write)
        } else if handle == service.notify.handle {
            Some(profile.notify)
        } else {
            None
        }
    };

    let mut request_id: u32 = 0;
    loop {
        match conn.next().await {
            GattConnectionEvent::Disconnected { reason } => {
                log::info!("BLE: Disconnected: {:?}", reason);
                break;
            }
            GattConnectionEvent::Gatt { event } => {
                request_id = request_id.wrapping_add(1);

                let handled = match &event {
                    GattEvent::Write(write_event) => match characteristic_for(write_event.handle()) {
                        Some(uuid) => {
                            server
                                .on_write_request(device, request_id, &uuid, write_event.data(), true)
                                .await;
                            true
                        }
                        None => false,
                    },
                    GattEvent::Read(read_event) => match characteristic_for(read_event.handle()) {
                        Some(uuid) => {
                            server.on_read_request(device, request_id, &uuid, 0).await;
                            true
                        }
                        None => false,
                    },
                    // CCCD and GAP attributes are answered by the stack
                    _ => false,
                };

                let status = if handled {
                    flush(conn, attributes, service, server, outbound, device).await
                } else {
                    GattStatus::Success
                };

                let reply = if status.is_success() {
                    event.accept()
                } else {
                    event.reject(att_error(status))
                };
                match reply {
                    Ok(reply) => reply.send().await,
                    Err(e) => log::warn!("BLE: Error sending response: {:?}", e),
                }
            }
            _ => {}
        }
    }

    server.on_connection_state_change(device, false).await;
}

/// Play back what the GATT server queued for one request. Notifications go
/// out first; the returned status decides the ATT reply.
async fn flush<P: PacketPool>(
    conn: &GattConnection<'_, '_, P>,
    attributes: &CalcAttributeServer,
    service: &CalcService,
    server: &CalcServer<'_>,
    outbound: &OutboundChannel,
    device: DeviceAddress,
) -> GattStatus {
    let mut status = GattStatus::Success;

    while let Ok(message) = outbound.try_receive() {
        match message {
            Outbound::Notify(value) => {
                // Keep the table in step so plain reads see the same value
                let _ = attributes.set(&service.notify, &value);
                let sent = match service.notify.notify(conn, &value).await {
                    Ok(()) => GattStatus::Success,
                    Err(_) => GattStatus::Failure,
                };
                server.on_notification_sent(device, sent);
            }
            Outbound::Response(response) => status = response,
        }
    }

    status
}
