//! Receiver side of a software-clocked "virtual UART" over four GPIO lines.
//!
//! Lines (as seen by the receiver):
//! - NOTIFY (in): sender raises it while a message is pending
//! - ENABLE (out): receiver raises it to request the next bit
//! - DATA (in): bit value, valid while CLOCK is high
//! - CLOCK (in): sender raises it once DATA is valid, drops it after ENABLE
//!   went low again
//!
//! Every single bit is a full handshake:
//!
//! ```text
//! ENABLE  ___/‾‾‾‾‾‾‾‾‾\_________
//! CLOCK   ______/‾‾‾‾‾‾‾‾‾\______
//! DATA    ----<  bit valid  >----
//!               ^ sample
//! ```
//!
//! Bytes are sent least significant bit first; a message is a sequence of
//! bytes terminated by a line feed (0x0a), which is not part of the message.
//!
//! There is no checksum, no framing besides the line feed and no timeout in
//! the protocol itself; all waits are unbounded unless configured otherwise.

mod bits;
mod hardware;
mod low_level;
mod message;
mod operations;
pub mod simulated;

pub use self::bits::{
	BitSequence,
	assemble,
	bits_of,
};

pub use self::hardware::{
	Bias,
	Direction,
	Hardware,
	Level,
	Line,
	reliable_sleep,
};

pub use self::low_level::{
	BitPhase,
	LowLevel,
	WaitPolicy,
};

pub use self::message::{
	LINE_FEED,
	Message,
};

pub use self::operations::{
	Receiver,
	ReceiverConfig,
};
