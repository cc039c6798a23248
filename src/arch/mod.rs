/*
 * Architecture Abstraction Layer
 *
 * XIO only needs one thing from the CPU: a way to keep the receive and
 * transmit ISRs out while application code touches state they share
 * (buffer indices, runtime flags). Everything else is portable.
 */

pub mod interrupts;
