use std::io;
use std::sync::atomic::{
	AtomicBool,
	Ordering,
};

use crate::error::{
	ReceiveError,
	as_receive_error,
};
use crate::vuart::{
	Hardware,
	Line,
	Message,
	Receiver,
};

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_stop(_signal: libc::c_int) {
	STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM into a flag for `ReceiverConfig::stop`.
pub fn install_stop_handler() -> crate::AResult<&'static AtomicBool> {
	for &signal in &[libc::SIGINT, libc::SIGTERM] {
		let previous = unsafe { libc::signal(signal, request_stop as *const () as libc::sighandler_t) };
		if libc::SIG_ERR == previous {
			bail!("couldn't install handler for signal {}: {}", signal, io::Error::last_os_error());
		}
	}
	Ok(&STOP_REQUESTED)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct RunSummary {
	pub messages: u64,
	pub timeouts: u64,
	pub protocol_violations: u64,
	pub consumer_errors: u64,
	/// stopped because the stop flag was set (instead of reaching the limit)
	pub interrupted: bool,
	/// stopped because the consumer's output went away (broken pipe)
	pub consumer_closed: bool,
}

fn is_broken_pipe(e: &failure::Error) -> bool {
	match e.downcast_ref::<io::Error>() {
		Some(e) => io::ErrorKind::BrokenPipe == e.kind(),
		None => false,
	}
}

/// Read messages and hand them to `consumer` until the stop flag is set or
/// `limit` messages were delivered.
///
/// Timeouts and over-long messages are logged and only cost the current
/// message; a NOTIFY timeout just means the sender was idle. A failing
/// consumer is logged too, unless it reports a broken pipe: then nobody is
/// listening anymore and the loop ends. Hardware faults end the loop with an
/// error.
pub fn run<H, F>(receiver: &mut Receiver<H>, limit: Option<u64>, mut consumer: F) -> crate::AResult<RunSummary>
where
	H: Hardware,
	F: FnMut(Message) -> crate::AResult<()>,
{
	let mut summary = RunSummary::default();

	while limit.map_or(true, |limit| summary.messages < limit) {
		let e = match receiver.read_message() {
			Ok(message) => {
				summary.messages += 1;
				debug!("message #{}: {} bytes", summary.messages, message.len());
				if let Err(e) = consumer(message) {
					if is_broken_pipe(&e) {
						info!("output closed after message #{}", summary.messages);
						summary.consumer_closed = true;
						break;
					}
					summary.consumer_errors += 1;
					warn!("failed to deliver message #{}: {}", summary.messages, e);
				}
				continue;
			},
			Err(e) => e,
		};

		match as_receive_error(&e) {
			Some(ReceiveError::Timeout { line: Line::Notify, .. }) => {
				trace!("no message pending");
			},
			Some(ReceiveError::Timeout { .. }) => {
				summary.timeouts += 1;
				warn!("message abandoned: {}", e);
			},
			Some(ReceiveError::ProtocolViolation { .. }) => {
				summary.protocol_violations += 1;
				warn!("message dropped: {}", e);
			},
			Some(ReceiveError::Interrupted(line)) => {
				info!("stop requested while waiting for {} line", line);
				summary.interrupted = true;
				break;
			},
			_ => return Err(e),
		}
	}

	Ok(summary)
}
