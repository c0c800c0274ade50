#![no_std]
#![no_main]

extern crate alloc;

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use calc_peripheral_firmware::config::firmware;
use calc_peripheral_firmware::gatt::ProfileIds;
use calc_peripheral_firmware::{debug, tasks};
use esp_backtrace as _;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use log::LevelFilter;
use static_cell::StaticCell;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// Type alias for the BLE controller
type BleController = trouble_host::prelude::ExternalController<
    esp_radio::ble::controller::BleConnector<'static>,
    10,
>;

#[esp_hal::main]
fn main() -> ! {
    // Initialise heap allocator for BLE support (64KB - BLE requires significant heap)
    esp_alloc::heap_allocator!(size: 64 * 1024);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    debug::init(LevelFilter::Info);
    log::info!(
        "Calculator peripheral v{}.{}.{}",
        firmware::VERSION_MAJOR,
        firmware::VERSION_MINOR,
        firmware::VERSION_PATCH
    );

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Fresh service and characteristic UUIDs every boot
    let rng = Rng::new();
    let mut random = [0u8; 48];
    rng.read(&mut random);
    let profile = ProfileIds::from_random_bytes(random);

    // Static random address derived from the eFuse MAC
    let mac = esp_hal::efuse::Efuse::read_base_mac_address();
    let address = [mac[3], mac[4], mac[5], 0x1E, 0x83, 0xE7];

    // Initialise esp-radio for BLE support (must be after esp_rtos::start)
    let radio_controller = RADIO_CONTROLLER.init(
        esp_radio::init().expect("Failed to initialize esp-radio")
    );

    // Create BLE connector (ownership is passed to ExternalController)
    let ble_connector = esp_radio::ble::controller::BleConnector::new(
        radio_controller,
        peripherals.BT,
        esp_radio::ble::Config::default(),
    ).expect("Failed to initialize BLE connector");

    // Wrap in ExternalController for trouble-host compatibility
    let controller: BleController = trouble_host::prelude::ExternalController::new(ble_connector);

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(ble_host_task(controller, profile, address));
    })
}

/// Task that manages BLE connectivity
#[embassy_executor::task]
async fn ble_host_task(controller: BleController, profile: ProfileIds, address: [u8; 6]) {
    tasks::ble_task(controller, profile, address).await;
    log::error!("BLE task exited, radio unavailable");
}
