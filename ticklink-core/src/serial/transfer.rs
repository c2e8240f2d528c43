//! Per-direction transfer state
//!
//! An [`AsyncTransfer`] tracks one read or one write from begin to
//! completion. It knows nothing about buffers or drivers: each step is
//! handed a closure that performs the driver call and updates the
//! remaining byte count.

use ticklink_hal::DriverError;

use super::SerialError;
use crate::timer::{SoftwareTimer, TickSource, TimeUnit, TimerError};

/// Final outcome of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    /// `Ok` when every byte was transferred
    pub status: Result<(), SerialError>,
    /// Bytes transferred before completion
    pub transferred: usize,
}

/// Transfer completion callback
///
/// Invoked synchronously from the call that completed the transfer:
/// `read`/`write` in synchronous mode, `run`, or `close`.
pub type CompletionCallback<'a> = &'a mut dyn FnMut(Completion);

pub(crate) struct AsyncTransfer<'a> {
    transfer_on: bool,
    data_length: usize,
    data_left: usize,
    data_left_prev: usize,
    transferred: usize,
    /// Zero waits forever
    timeout_ms: u32,
    timer: SoftwareTimer<'a>,
    callback: Option<CompletionCallback<'a>>,
}

impl<'a> AsyncTransfer<'a> {
    pub(crate) fn new(
        tick_source: &'a dyn TickSource,
        callback: Option<CompletionCallback<'a>>,
    ) -> Self {
        Self {
            transfer_on: false,
            data_length: 0,
            data_left: 0,
            data_left_prev: 0,
            transferred: 0,
            timeout_ms: 0,
            timer: SoftwareTimer::new(tick_source),
            callback,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.transfer_on
    }

    pub(crate) fn transferred(&self) -> usize {
        self.transferred
    }

    pub(crate) fn set_invocation_limit(&mut self, limit: u32) {
        self.timer.set_invocation_limit(limit);
    }

    /// Transfers without a callback or without a timeout block the caller
    pub(crate) fn is_synchronous(&self) -> bool {
        self.callback.is_none() || self.timeout_ms == 0
    }

    /// Claim the direction for a new transfer of `length` bytes
    ///
    /// Leaves the running transfer untouched if there is one.
    pub(crate) fn begin(&mut self, length: usize, timeout_ms: u32) -> Result<(), SerialError> {
        if self.transfer_on {
            return Err(SerialError::TransferInProgress);
        }

        self.transfer_on = true;
        self.data_length = length;
        self.data_left = length;
        self.data_left_prev = 0;
        self.transferred = 0;
        self.timeout_ms = timeout_ms;

        if timeout_ms != 0 {
            self.timer.start();
        }

        trace!("transfer begin: {=usize} bytes, timeout {=u32} ms", length, timeout_ms);
        Ok(())
    }

    /// Perform one driver call and settle the outcome
    ///
    /// `Ok(())` means the transfer either completed successfully or is
    /// still running; no-op when nothing is in progress.
    pub(crate) fn step<F>(&mut self, transfer: F) -> Result<(), SerialError>
    where
        F: FnOnce(&mut usize) -> Result<(), DriverError>,
    {
        if !self.transfer_on {
            return Ok(());
        }

        // Empty/full reports only mean no progress this step
        if let Err(DriverError::HardwareFailure) = transfer(&mut self.data_left) {
            self.complete(Err(SerialError::TransferFailed));
            return Err(SerialError::TransferFailed);
        }

        if self.data_left == 0 {
            self.complete(Ok(()));
            return Ok(());
        }

        self.manage_timeout()
    }

    /// Step until the transfer completes
    pub(crate) fn run_to_completion<F>(&mut self, mut transfer: F) -> Result<(), SerialError>
    where
        F: FnMut(&mut usize) -> Result<(), DriverError>,
    {
        while self.transfer_on {
            self.step(&mut transfer)?;
        }
        Ok(())
    }

    /// Complete a running transfer as cancelled
    pub(crate) fn cancel(&mut self) {
        if self.transfer_on {
            debug!("transfer cancelled with {=usize} bytes left", self.data_left);
            self.complete(Err(SerialError::Cancelled));
        }
    }

    fn manage_timeout(&mut self) -> Result<(), SerialError> {
        if self.timeout_ms == 0 {
            return Ok(());
        }

        // Any progress restarts the timeout window
        if self.data_left != self.data_left_prev {
            self.data_left_prev = self.data_left;
            self.timer.start();
            return Ok(());
        }

        match self.timer.elapsed(TimeUnit::Millis) {
            Ok(elapsed_ms) if elapsed_ms > self.timeout_ms => {
                self.complete(Err(SerialError::Timeout));
                Err(SerialError::Timeout)
            }
            Ok(_) => Ok(()),
            Err(TimerError::Starving) => {
                self.complete(Err(SerialError::TimerStarving));
                Err(SerialError::TimerStarving)
            }
        }
    }

    fn complete(&mut self, status: Result<(), SerialError>) {
        self.transfer_on = false;
        self.transferred = self.data_length.saturating_sub(self.data_left);

        debug!(
            "transfer completed: {}, {=usize}/{=usize} bytes",
            status, self.transferred, self.data_length
        );

        if let Some(callback) = self.callback.as_mut() {
            callback(Completion {
                status,
                transferred: self.transferred,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerBase;
    use core::cell::RefCell;
    use heapless::Vec;

    type Log = RefCell<Vec<Completion, 8>>;

    fn chunked(chunk: usize) -> impl FnMut(&mut usize) -> Result<(), DriverError> {
        move |left: &mut usize| {
            *left -= chunk.min(*left);
            Ok(())
        }
    }

    #[test]
    fn test_begin_rejects_second_transfer() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.begin(10, 5).unwrap();
        transfer.step(chunked(3)).unwrap();

        assert_eq!(transfer.begin(4, 0), Err(SerialError::TransferInProgress));
        assert!(transfer.is_active());
        assert_eq!(transfer.data_length, 10);
        assert_eq!(transfer.data_left, 7);
        assert_eq!(transfer.timeout_ms, 5);
    }

    #[test]
    fn test_mode_selection() {
        let base = TimerBase::ticked(1000, 32);
        let log: Log = RefCell::new(Vec::new());
        let mut record = |c: Completion| {
            let _ = log.borrow_mut().push(c);
        };

        let mut without_callback = AsyncTransfer::new(&base, None);
        without_callback.begin(1, 100).unwrap();
        assert!(without_callback.is_synchronous());

        let mut with_callback = AsyncTransfer::new(&base, Some(&mut record));
        with_callback.begin(1, 0).unwrap();
        assert!(with_callback.is_synchronous());
        with_callback.cancel();
        with_callback.begin(1, 100).unwrap();
        assert!(!with_callback.is_synchronous());
    }

    #[test]
    fn test_step_without_transfer_is_noop() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        let mut called = false;
        transfer
            .step(|_| {
                called = true;
                Ok(())
            })
            .unwrap();
        assert!(!called);
    }

    #[test]
    fn test_hardware_failure_completes_once() {
        let base = TimerBase::ticked(1000, 32);
        let log: Log = RefCell::new(Vec::new());
        let mut record = |c: Completion| {
            let _ = log.borrow_mut().push(c);
        };
        let mut transfer = AsyncTransfer::new(&base, Some(&mut record));

        transfer.begin(8, 10).unwrap();
        assert_eq!(
            transfer.step(|left| {
                *left -= 2;
                Err(DriverError::HardwareFailure)
            }),
            Err(SerialError::TransferFailed)
        );
        assert!(!transfer.is_active());
        transfer.cancel();
        drop(transfer);

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, Err(SerialError::TransferFailed));
        assert_eq!(log[0].transferred, 2);
    }

    #[test]
    fn test_empty_and_full_reports_are_not_failures() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.begin(2, 10).unwrap();

        assert!(transfer.step(|_| Err(DriverError::RxBufferEmpty)).is_ok());
        assert!(transfer.step(|_| Err(DriverError::TxBufferFull)).is_ok());
        assert!(transfer.is_active());
    }

    #[test]
    fn test_timeout_after_no_progress() {
        let base = TimerBase::ticked(1000, 32); // 1 ms per tick
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.begin(4, 5).unwrap();

        // First step counts as progress and restarts the timer
        transfer.step(chunked(0)).unwrap();
        base.tick(5);
        assert!(transfer.step(chunked(0)).is_ok());

        base.tick(1);
        assert_eq!(transfer.step(chunked(0)), Err(SerialError::Timeout));
        assert!(!transfer.is_active());
        assert_eq!(transfer.transferred(), 0);
    }

    #[test]
    fn test_progress_restarts_timeout_window() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.begin(4, 5).unwrap();

        // Far beyond the timeout, but every step makes progress
        for _ in 0..3 {
            base.tick(50);
            transfer.step(chunked(1)).unwrap();
            assert!(transfer.is_active());
        }
        base.tick(6);
        transfer.step(chunked(1)).unwrap();
        assert!(!transfer.is_active());
        assert_eq!(transfer.transferred(), 4);
    }

    #[test]
    fn test_zero_timeout_never_expires() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.begin(4, 0).unwrap();

        for _ in 0..100 {
            base.tick(1000);
            transfer.step(chunked(0)).unwrap();
        }
        assert!(transfer.is_active());
    }

    #[test]
    #[cfg(feature = "starvation")]
    fn test_starving_timer_completes_transfer() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.set_invocation_limit(2);
        transfer.begin(4, 5).unwrap();

        transfer.step(chunked(0)).unwrap();
        transfer.step(chunked(0)).unwrap();
        transfer.step(chunked(0)).unwrap();
        assert_eq!(transfer.step(chunked(0)), Err(SerialError::TimerStarving));
        assert!(!transfer.is_active());
    }

    #[test]
    fn test_run_to_completion() {
        let base = TimerBase::ticked(1000, 32);
        let mut transfer = AsyncTransfer::new(&base, None);
        transfer.begin(10, 0).unwrap();

        let mut calls = 0;
        transfer
            .run_to_completion(|left| {
                calls += 1;
                *left -= 3.min(*left);
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 4);
        assert_eq!(transfer.transferred(), 10);
    }
}
