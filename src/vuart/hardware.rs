use std::fmt;
use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Line {
	Notify,
	Enable,
	Data,
	Clock,
}

impl Line {
	pub const ALL: [Line; 4] = [Line::Notify, Line::Enable, Line::Data, Line::Clock];

	pub fn index(self) -> usize {
		match self {
			Line::Notify => 0,
			Line::Enable => 1,
			Line::Data => 2,
			Line::Clock => 3,
		}
	}

	/// direction from the receiver's point of view
	pub fn direction(self) -> Direction {
		match self {
			Line::Enable => Direction::Output,
			_ => Direction::Input,
		}
	}

	/// inputs idle low so a missing sender reads as "nothing to do"
	pub fn bias(self) -> Bias {
		match self {
			Line::Enable => Bias::AsIs,
			_ => Bias::PullDown,
		}
	}
}

impl fmt::Display for Line {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			Line::Notify => "notify",
			Line::Enable => "enable",
			Line::Data => "data",
			Line::Clock => "clock",
		})
	}
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
	Low,
	High,
}

impl From<bool> for Level {
	fn from(v: bool) -> Self {
		match v {
			false => Level::Low,
			true => Level::High,
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			Level::Low => "low",
			Level::High => "high",
		})
	}
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Input,
	Output,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Bias {
	/// leave whatever the hardware defaults to
	AsIs,
	Disabled,
	PullUp,
	PullDown,
}

/// The four lines of one receiver.
///
/// Implementations own the underlying handles; `configure` is called once
/// per line before any `read_line`/`write_line`. Failures should be reported
/// as `ReceiveError::HardwareFault`.
pub trait Hardware {
	fn configure(&mut self, line: Line, direction: Direction, bias: Bias) -> crate::AResult<()>;

	/// true = high
	fn read_line(&mut self, line: Line) -> crate::AResult<bool>;

	fn write_line(&mut self, line: Line, high: bool) -> crate::AResult<()>;
}

impl<'a, H: ?Sized + Hardware> Hardware for &'a mut H {
	fn configure(&mut self, line: Line, direction: Direction, bias: Bias) -> crate::AResult<()> {
		H::configure(*self, line, direction, bias)
	}

	fn read_line(&mut self, line: Line) -> crate::AResult<bool> {
		H::read_line(*self, line)
	}

	fn write_line(&mut self, line: Line, high: bool) -> crate::AResult<()> {
		H::write_line(*self, line, high)
	}
}

impl<H: ?Sized + Hardware> Hardware for Box<H> {
	fn configure(&mut self, line: Line, direction: Direction, bias: Bias) -> crate::AResult<()> {
		H::configure(&mut **self, line, direction, bias)
	}

	fn read_line(&mut self, line: Line) -> crate::AResult<bool> {
		H::read_line(&mut **self, line)
	}

	fn write_line(&mut self, line: Line, high: bool) -> crate::AResult<()> {
		H::write_line(&mut **self, line, high)
	}
}
