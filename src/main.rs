#![no_main]
#![no_std]

use panic_probe as _;
use defmt_rtt as _;
use stm32f0xx_hal as hal;
use packetlink as lib;

use lib::hal_ext::SharedQueue;

const QUEUE_SIZE: usize = 256;

// Largest reply burst must fit in an empty TX queue
static_assertions::const_assert!(QUEUE_SIZE >= lib::ioqueue::packet::PACKET_SIZE * lib::commands::MAX_REPLIES);

static RX_QUEUE: SharedQueue<QUEUE_SIZE> = SharedQueue::new();
static TX_QUEUE: SharedQueue<QUEUE_SIZE> = SharedQueue::new();

#[rtic::app(device = crate::hal::pac)]
mod app {
    use cortex_m::interrupt::free as ifree;
    use super::hal;
    use hal::prelude::*;

    use super::lib;
    use lib::commands::Handler;
    use lib::config::CONFIG;
    use lib::hal_ext::{uart, SharedQueue};
    use super::{QUEUE_SIZE, RX_QUEUE, TX_QUEUE};
    use lib::ioqueue::{self, Receiver, Transmitter};

    type Queue = &'static SharedQueue<QUEUE_SIZE>;
    type UartRx = uart::UartRx<'static, hal::serial::Rx<hal::pac::USART1>, QUEUE_SIZE>;
    type UartTx = uart::UartTx<'static, hal::serial::Tx<hal::pac::USART1>, QUEUE_SIZE>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        uart_rx: UartRx,
        uart_tx: UartTx,
        receiver: Receiver<Queue>,
        transmitter: Transmitter<Queue>,
        handler: Handler,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut dev = cx.device;

        defmt::info!("{=str} v{=str} ({=str})",
            lib::built_info::PKG_NAME, lib::built_info::PKG_VERSION, lib::built_info::PROFILE);
        defmt::info!("Config: {}", CONFIG);

        let sysclk: hal::time::Hertz = 48.mhz().into();
        let pclk: hal::time::Hertz = 24.mhz().into();
        let mut rcc = dev.RCC
            .configure()
            .hsi48()
            .enable_crs(dev.CRS)
            .sysclk(sysclk)
            .pclk(pclk)
            .freeze(&mut dev.FLASH);

        let gpioa = dev.GPIOA.split(&mut rcc);

        // UART
        let tx_pin = ifree(|cs| gpioa.pa9.into_alternate_af1(cs));
        let rx_pin = ifree(|cs| gpioa.pa10.into_alternate_af1(cs));
        let mut serial = hal::serial::Serial::usart1(
            dev.USART1,
            (tx_pin, rx_pin),
            CONFIG.baud_rate.bps(),
            &mut rcc,
        );
        serial.listen(hal::serial::Event::Rxne);
        let (tx, rx) = serial.split();
        let (uart_rx, uart_tx) = uart::Uart::new((rx, tx), (&RX_QUEUE, &TX_QUEUE)).split();

        let receiver = Receiver::new(&RX_QUEUE);
        let mut transmitter = Transmitter::new(&TX_QUEUE);
        let handler = Handler::new(&CONFIG);

        for packet in handler.startup_packets() {
            transmitter.send(packet);
        }

        let shared = Shared {};
        let local = Local { uart_rx, uart_tx, receiver, transmitter, handler };

        (shared, local, init::Monotonics())
    }

    #[task(binds = USART1, priority = 2, local = [uart_rx])]
    fn uart_interrupt(cx: uart_interrupt::Context) {
        // Failures are counted and logged by UartRx; reading clears the error flags
        // so the next interrupt continues with fresh data.
        if let Ok(n) = cx.local.uart_rx.on_interrupt() {
            defmt::trace!("UART RX {=usize} bytes", n);
        }
    }

    #[idle(local = [uart_tx, receiver, transmitter, handler,
        rx_stats: ioqueue::receiver::Stats = ioqueue::receiver::Stats { packets: 0, checksum_failures: 0 },
    ])]
    fn idle(cx: idle::Context) -> ! {
        let receiver = cx.local.receiver;
        let transmitter = cx.local.transmitter;
        let handler = cx.local.handler;
        let uart_tx = cx.local.uart_tx;

        loop {
            if let Some(packet) = receiver.try_assemble() {
                defmt::debug!("RX packet: {}", packet);
                for reply in handler.handle(&packet) {
                    transmitter.send(reply);
                }
            }

            if uart_tx.poll().is_err() {
                defmt::error!("UART TX error");
            }

            let stats = receiver.stats();
            if stats != cx.local.rx_stats {
                if stats.checksum_failures != cx.local.rx_stats.checksum_failures {
                    defmt::warn!("RX stats: {}", stats);
                }
                *cx.local.rx_stats = stats.clone();
            }
        }
    }
}
