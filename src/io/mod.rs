/*
 * XIO Device Layer
 *
 * Device-independent character I/O: control flags, ring buffers, flow
 * control, signal interception, line assembly and the descriptor table
 * that ties them to concrete backends.
 */

pub mod ascii;
pub mod buffer;
pub mod descriptor;
pub mod device;
pub mod flags;
pub mod flow;
pub mod line;
pub mod signals;
pub mod stream;
pub mod table;

pub use descriptor::{Backend, Descriptor};
pub use device::{DEVICE_COUNT, DeviceId, DeviceOps, FILE_COUNT, OpenTarget, USART_COUNT, XioCode, XioError};
pub use flags::{Control, DeviceFlags};
pub use flow::FlowState;
pub use line::Line;
pub use signals::Signal;
pub use stream::Stream;
pub use table::{DescriptorTable, init, try_table};
