use embedded_hal::serial;

use super::fifo::SharedQueue;

/// Serial transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Hardware reported a reception error (overrun, framing, noise, parity)
    Serial(E),
    /// Receive queue was full and at least one byte has been dropped
    Overflow,
}

/// UART reception statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct Stats {
    /// Bytes lost because the receive queue was full
    pub dropped: u32,
    /// Hardware reception errors
    pub errors: u32,
}

/// Interrupt-driven UART
///
/// Moves bytes between serial hardware and a pair of [`SharedQueue`]s. The
/// application side only ever touches the queues (see [`crate::ioqueue`]).
pub struct Uart<'q, RX, TX, const R: usize, const T: usize> {
    pub rx: UartRx<'q, RX, R>,
    pub tx: UartTx<'q, TX, T>,
}

/// UART RX half
///
/// Call [`Self::on_interrupt`] from the receive interrupt service routine.
pub struct UartRx<'q, RX, const N: usize> {
    rx: RX,
    queue: &'q SharedQueue<N>,
    stats: Stats,
}

/// UART TX half
///
/// Call [`Self::poll`] periodically (e.g. from the main loop) to push queued
/// bytes to the hardware.
pub struct UartTx<'q, TX, const N: usize> {
    tx: TX,
    queue: &'q SharedQueue<N>,
    // Byte taken from the queue but not yet accepted by hardware
    pending: Option<u8>,
}

impl<'q, RX, TX, const R: usize, const T: usize> Uart<'q, RX, TX, R, T>
where
    RX: serial::Read<u8>,
    TX: serial::Write<u8>,
{
    /// Create the transport, emptying both queues
    pub fn new(
        (rx, tx): (RX, TX),
        (rx_queue, tx_queue): (&'q SharedQueue<R>, &'q SharedQueue<T>),
    ) -> Self {
        rx_queue.init();
        tx_queue.init();
        Self {
            rx: UartRx::new(rx, rx_queue),
            tx: UartTx::new(tx, tx_queue),
        }
    }

    pub fn split(self) -> (UartRx<'q, RX, R>, UartTx<'q, TX, T>) {
        (self.rx, self.tx)
    }
}

impl<'q, RX, const N: usize> UartRx<'q, RX, N>
where
    RX: serial::Read<u8>,
{
    pub fn new(rx: RX, queue: &'q SharedQueue<N>) -> Self {
        Self { rx, queue, stats: Stats::default() }
    }

    /// Move all bytes available in hardware to the receive queue
    ///
    /// Returns the number of bytes queued. Bytes that do not fit are dropped; the
    /// drain stops at the first hardware error.
    pub fn on_interrupt(&mut self) -> Result<usize, Error<RX::Error>> {
        let mut queued = 0;
        let mut dropped = 0;

        loop {
            match self.rx.read() {
                Ok(byte) => {
                    if self.queue.put(byte) {
                        queued += 1;
                    } else {
                        dropped += 1;
                    }
                },
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    self.stats.errors = self.stats.errors.wrapping_add(1);
                    self.stats.dropped = self.stats.dropped.wrapping_add(dropped);
                    link_log!(error, "UART RX error after {=usize} bytes", queued);
                    return Err(Error::Serial(e));
                },
            }
        }

        if dropped != 0 {
            self.stats.dropped = self.stats.dropped.wrapping_add(dropped);
            link_log!(warn, "RX queue full, dropped {=u32} bytes", dropped);
            return Err(Error::Overflow);
        }

        Ok(queued)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn free(self) -> RX {
        self.rx
    }
}

impl<'q, TX, const N: usize> UartTx<'q, TX, N>
where
    TX: serial::Write<u8>,
{
    pub fn new(tx: TX, queue: &'q SharedQueue<N>) -> Self {
        Self { tx, queue, pending: None }
    }

    /// Write queued bytes until the hardware would block
    ///
    /// Returns the number of bytes written. A byte refused by the hardware is
    /// retried first on the next call, so ordering is preserved.
    pub fn poll(&mut self) -> Result<usize, TX::Error> {
        let mut written = 0;

        while let Some(byte) = self.pending.take().or_else(|| self.queue.get()) {
            match self.tx.write(byte) {
                Ok(()) => written += 1,
                Err(e) => {
                    self.pending = Some(byte);
                    match e {
                        nb::Error::WouldBlock => break,
                        nb::Error::Other(e) => return Err(e),
                    }
                },
            }
        }

        Ok(written)
    }

    /// No data waiting for transmission
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.queue.is_empty()
    }

    pub fn free(self) -> TX {
        self.tx
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::{SerialRxMock, SerialTxMock, MockError};
    use std::vec::Vec;

    fn drain<const N: usize>(q: &SharedQueue<N>) -> Vec<u8> {
        core::iter::from_fn(|| q.get()).collect()
    }

    #[test]
    fn new_empties_queues() {
        let (rxq, txq) = (SharedQueue::<8>::new(), SharedQueue::<8>::new());
        rxq.put(1);
        txq.put(2);
        let _uart = Uart::new((SerialRxMock::default(), SerialTxMock::default()), (&rxq, &txq));
        assert!(rxq.is_empty());
        assert!(txq.is_empty());
    }

    #[test]
    fn rx_moves_all_bytes() {
        let q = SharedQueue::<8>::new();
        let mut rx = UartRx::new(SerialRxMock::with(&[1, 2, 3]), &q);
        assert_eq!(rx.on_interrupt(), Ok(3));
        assert_eq!(rx.on_interrupt(), Ok(0));
        assert_eq!(drain(&q), [1, 2, 3]);
    }

    #[test]
    fn rx_drops_when_full() {
        let q = SharedQueue::<2>::new();
        let mut rx = UartRx::new(SerialRxMock::with(&[1, 2, 3, 4]), &q);
        assert_eq!(rx.on_interrupt(), Err(Error::Overflow));
        assert_eq!(rx.stats(), &Stats { dropped: 2, errors: 0 });
        assert_eq!(drain(&q), [1, 2]);
        // hardware has been fully drained
        assert_eq!(rx.free().input.len(), 0);
    }

    #[test]
    fn rx_stops_on_error() {
        let q = SharedQueue::<8>::new();
        let mut mock = SerialRxMock::with(&[1]);
        mock.input.push_back(Err(MockError));
        mock.input.push_back(Ok(2));
        let mut rx = UartRx::new(mock, &q);
        assert_eq!(rx.on_interrupt(), Err(Error::Serial(MockError)));
        assert_eq!(rx.stats().errors, 1);
        assert_eq!(rx.on_interrupt(), Ok(1));
        assert_eq!(drain(&q), [1, 2]);
    }

    #[test]
    fn tx_writes_until_blocked() {
        let q = SharedQueue::<8>::new();
        q.put_all(&[1, 2, 3, 4, 5]);
        let mut tx = UartTx::new(SerialTxMock { ready: 2, ..Default::default() }, &q);

        assert_eq!(tx.poll(), Ok(2));
        assert!(!tx.is_idle());
        assert_eq!(tx.poll(), Ok(0));

        tx.tx.ready = 10;
        assert_eq!(tx.poll(), Ok(3));
        assert!(tx.is_idle());
        assert_eq!(tx.free().sent, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn tx_keeps_byte_on_error() {
        let q = SharedQueue::<8>::new();
        q.put_all(&[7, 8]);
        let mut tx = UartTx::new(SerialTxMock { ready: 10, fail: true, ..Default::default() }, &q);
        assert_eq!(tx.poll(), Err(MockError));
        assert_eq!(q.len(), 1);

        tx.tx.fail = false;
        assert_eq!(tx.poll(), Ok(2));
        assert_eq!(tx.free().sent, [7, 8]);
    }

    #[test]
    fn split_halves() {
        let (rxq, txq) = (SharedQueue::<8>::new(), SharedQueue::<8>::new());
        let uart = Uart::new(
            (SerialRxMock::with(&[0x04, 0, 0, 0, 0x04]), SerialTxMock { ready: 8, ..Default::default() }),
            (&rxq, &txq),
        );
        let (mut rx, mut tx) = uart.split();
        assert_eq!(rx.on_interrupt(), Ok(5));
        // loop the received bytes back
        while let Some(b) = rxq.get() {
            txq.put(b);
        }
        assert_eq!(tx.poll(), Ok(5));
        assert_eq!(tx.free().sent, [0x04, 0, 0, 0, 0x04]);
    }
}
