//! GPIO character device backend for the receiver lines.

use std::fmt;
use std::fs;
use std::path::{
	Path,
	PathBuf,
};
use std::str;

use crate::error::ReceiveError;
use crate::vuart::{
	Bias,
	Direction,
	Hardware,
	Line,
};

// OS-specific. for now linux only.
mod linux;

use self::linux::LineHandle;

pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Line offset in the chip's native numbering (BCM numbering on a Raspberry Pi)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl str::FromStr for LineId {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let id = with_context!(("invalid GPIO line: {:?}", s),
			Ok(s.trim().parse::<u32>()?)
		)?;
		Ok(LineId(id))
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LineMap {
	pub notify: LineId,
	pub enable: LineId,
	pub data: LineId,
	pub clock: LineId,
}

impl Default for LineMap {
	fn default() -> Self {
		LineMap {
			notify: LineId(1),
			enable: LineId(7),
			data: LineId(25),
			clock: LineId(8),
		}
	}
}

impl LineMap {
	pub fn get(&self, line: Line) -> LineId {
		match line {
			Line::Notify => self.notify,
			Line::Enable => self.enable,
			Line::Data => self.data,
			Line::Clock => self.clock,
		}
	}

	pub fn validate(&self) -> crate::AResult<()> {
		for (i, &a) in Line::ALL.iter().enumerate() {
			for &b in &Line::ALL[i + 1..] {
				ensure!(self.get(a) != self.get(b),
					"{} and {} lines both use GPIO line {}", a, b, self.get(a)
				);
			}
		}
		Ok(())
	}
}

impl fmt::Display for LineMap {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "notify={}, enable={}, data={}, clock={}", self.notify, self.enable, self.data, self.clock)
	}
}

/// Receiver lines on a GPIO character device.
#[derive(Debug)]
pub struct GpioChip {
	chip: fs::File,
	path: PathBuf,
	map: LineMap,
	handles: [Option<LineHandle>; 4],
}

impl GpioChip {
	fn handle(&self, line: Line) -> crate::AResult<&LineHandle> {
		match &self.handles[line.index()] {
			Some(handle) => Ok(handle),
			None => Err(ReceiveError::hardware_fault(
				format_args!("{} line (GPIO {})", line, self.map.get(line)),
				"not configured",
			)),
		}
	}
}

impl Hardware for GpioChip {
	fn configure(&mut self, line: Line, direction: Direction, bias: Bias) -> crate::AResult<()> {
		let id = self.map.get(line);
		// replaces (and releases) a previous request for the same line
		self.handles[line.index()] = None;
		let handle = LineHandle::request(&self.chip, id.0, direction, bias).map_err(|e| {
			ReceiveError::hardware_fault(
				format_args!("requesting {} line (GPIO {} on {}) as {:?} with bias {:?}", line, id, self.path.display(), direction, bias),
				e,
			)
		})?;
		debug!("{} line: GPIO {} configured as {:?}, bias {:?}", line, handle.offset(), direction, bias);
		self.handles[line.index()] = Some(handle);
		Ok(())
	}

	fn read_line(&mut self, line: Line) -> crate::AResult<bool> {
		let handle = self.handle(line)?;
		handle.get().map_err(|e| {
			ReceiveError::hardware_fault(format_args!("reading {} line (GPIO {})", line, handle.offset()), e)
		})
	}

	fn write_line(&mut self, line: Line, high: bool) -> crate::AResult<()> {
		let handle = self.handle(line)?;
		handle.set(high).map_err(|e| {
			ReceiveError::hardware_fault(format_args!("writing {} line (GPIO {})", line, handle.offset()), e)
		})
	}
}

/// Opens the chip; lines are requested later by `Hardware::configure`.
pub fn open_chip<P: AsRef<Path>>(path: P, map: LineMap) -> crate::AResult<GpioChip> {
	map.validate()?;
	let path = path.as_ref();
	let chip = linux::open_chip(path).map_err(|e| {
		ReceiveError::hardware_fault(format_args!("opening GPIO chip {}", path.display()), e)
	})?;
	info!("opened GPIO chip {} ({})", path.display(), map);

	Ok(GpioChip {
		chip,
		path: path.to_path_buf(),
		map,
		handles: [None, None, None, None],
	})
}
