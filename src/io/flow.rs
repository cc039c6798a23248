/*
 * XON/XOFF Flow Control
 *
 * Outbound software flow control: a buffered device asks its remote
 * sender to pause when the receive buffer fills and to resume once the
 * application starts draining it.
 *
 *   Clear --(occupancy >= high water, or overrun)--> RequestPause
 *   RequestPause --(transmitter sends XOFF)--> Paused
 *   Paused --(successful read)--> RequestResume
 *   RequestResume --(transmitter sends XON)--> Clear
 *
 * The state is not stored separately; it is derived from the DO_XOFF,
 * DO_XON and IN_XOFF runtime bits. A pending XOFF/XON stays latched until
 * the transmit path actually sends it.
 */

use log::trace;

use super::ascii::{XOFF, XON};
use super::flags::{DeviceFlags, RuntimeFlags, StateFlags};

/// Where a device stands in the pause/resume protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Clear,
    /// XOFF must go out at the next transmit opportunity
    RequestPause,
    Paused,
    /// XON must go out at the next transmit opportunity
    RequestResume,
}

impl DeviceFlags {
    /// Current flow-control state.
    pub fn flow_state(&self) -> FlowState {
        self.runtime().flow_state()
    }
}

impl RuntimeFlags<'_> {
    pub fn flow_state(&self) -> FlowState {
        if self.xoff_pending() {
            FlowState::RequestPause
        } else if self.xon_pending() {
            FlowState::RequestResume
        } else if self.in_xoff() {
            FlowState::Paused
        } else {
            FlowState::Clear
        }
    }
}

/// Receive side, called from the RX ISR after a byte was offered to the buffer.
///
/// Returns true when the transmitter has to be kicked to send XOFF.
pub(crate) fn on_receive(flags: RuntimeFlags<'_>, occupancy: usize, high_water: usize, overrun: bool) -> bool {
    if !flags.flow_control_enabled() || flags.flow_state() != FlowState::Clear {
        return false;
    }
    if overrun || occupancy >= high_water {
        flags.set_state(StateFlags::DO_XOFF);
        trace!("xio: flow control requesting pause at {} bytes", occupancy);
        return true;
    }
    false
}

/// Drain side, called after every successful read.
///
/// Returns true when the transmitter has to be kicked to send XON.
pub(crate) fn on_read(flags: RuntimeFlags<'_>) -> bool {
    if flags.flow_state() != FlowState::Paused {
        return false;
    }
    flags.set_state(StateFlags::DO_XON);
    trace!("xio: flow control requesting resume");
    true
}

/// Transmit side: the control byte owed to the remote sender, if any.
///
/// Takes the byte and advances the state; the caller must put it on the wire.
pub(crate) fn next_control_byte(flags: RuntimeFlags<'_>) -> Option<u8> {
    match flags.flow_state() {
        FlowState::RequestPause => {
            // IN_XOFF first so the state never reads Clear in between.
            flags.set_state(StateFlags::IN_XOFF);
            flags.clear_state(StateFlags::DO_XOFF);
            Some(XOFF)
        }
        FlowState::RequestResume => {
            flags.clear_state(StateFlags::DO_XON | StateFlags::IN_XOFF);
            Some(XON)
        }
        FlowState::Clear | FlowState::Paused => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::flags::Control;

    fn flow_controlled() -> DeviceFlags {
        let flags = DeviceFlags::new();
        flags.configure(Control::RDWR | Control::XOFF);
        flags
    }

    #[test]
    fn full_cycle_emits_xoff_then_xon() {
        let flags = flow_controlled();
        assert_eq!(flags.flow_state(), FlowState::Clear);

        assert!(!on_receive(flags.runtime(), 9, 10, false));
        assert!(on_receive(flags.runtime(), 10, 10, false));
        assert_eq!(flags.flow_state(), FlowState::RequestPause);

        assert_eq!(next_control_byte(flags.runtime()), Some(XOFF));
        assert_eq!(flags.flow_state(), FlowState::Paused);

        // still paused while more payload arrives
        assert!(!on_receive(flags.runtime(), 11, 10, false));
        assert_eq!(flags.flow_state(), FlowState::Paused);
        assert_eq!(next_control_byte(flags.runtime()), None);

        assert!(on_read(flags.runtime()));
        assert_eq!(flags.flow_state(), FlowState::RequestResume);

        assert_eq!(next_control_byte(flags.runtime()), Some(XON));
        assert_eq!(flags.flow_state(), FlowState::Clear);
        assert_eq!(next_control_byte(flags.runtime()), None);
    }

    #[test]
    fn pending_request_survives_until_sent() {
        let flags = flow_controlled();
        on_receive(flags.runtime(), 50, 10, false);
        // reads before the XOFF went out do not cancel it
        assert!(!on_read(flags.runtime()));
        assert!(!on_read(flags.runtime()));
        assert_eq!(flags.flow_state(), FlowState::RequestPause);
        assert_eq!(next_control_byte(flags.runtime()), Some(XOFF));
    }

    #[test]
    fn overrun_requests_pause_below_high_water() {
        let flags = flow_controlled();
        assert!(on_receive(flags.runtime(), 3, 10, true));
        assert!(flags.xoff_pending());
    }

    #[test]
    fn disabled_flow_control_never_pauses() {
        let flags = DeviceFlags::new();
        flags.configure(Control::RDWR | Control::NOXOFF);
        assert!(!on_receive(flags.runtime(), 100, 10, true));
        assert_eq!(flags.flow_state(), FlowState::Clear);
        assert!(!on_read(flags.runtime()));
    }

    #[test]
    fn read_while_clear_is_a_no_op() {
        let flags = flow_controlled();
        assert!(!on_read(flags.runtime()));
        assert_eq!(flags.state(), StateFlags::empty());
    }
}
