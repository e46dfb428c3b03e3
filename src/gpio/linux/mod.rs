use std::fs;
use std::io;
use std::os::unix::io::{
	AsRawFd,
	FromRawFd,
};
use std::path::Path;

use libc::ioctl;

mod uapi;

use self::uapi::*;
use crate::vuart::{
	Bias,
	Direction,
};

const CONSUMER_LABEL: &str = "gpio-vuart";

pub fn open_chip(path: &Path) -> io::Result<fs::File> {
	fs::OpenOptions::new()
		.read(true)
		.write(true)
		.open(path)
}

fn request_flags(direction: Direction, bias: Bias) -> u32 {
	let direction = match direction {
		Direction::Input => GPIOHANDLE_REQUEST_INPUT,
		Direction::Output => GPIOHANDLE_REQUEST_OUTPUT,
	};
	let bias = match bias {
		Bias::AsIs => 0,
		Bias::Disabled => GPIOHANDLE_REQUEST_BIAS_DISABLE,
		Bias::PullUp => GPIOHANDLE_REQUEST_BIAS_PULL_UP,
		Bias::PullDown => GPIOHANDLE_REQUEST_BIAS_PULL_DOWN,
	};
	direction | bias
}

/// A single requested line; released when dropped.
#[derive(Debug)]
pub struct LineHandle {
	// owns the fd returned by the kernel
	file: fs::File,
	offset: u32,
}

impl LineHandle {
	/// Outputs start low.
	pub fn request(chip: &fs::File, offset: u32, direction: Direction, bias: Bias) -> io::Result<Self> {
		let mut request = HandleRequest::single(offset, request_flags(direction, bias), false, CONSUMER_LABEL);
		let res = unsafe { ioctl(chip.as_raw_fd(), GPIO_GET_LINEHANDLE_IOCTL as _, &mut request as *mut HandleRequest) };
		if -1 == res {
			return Err(io::Error::last_os_error());
		}
		if request.fd < 0 {
			return Err(io::Error::new(io::ErrorKind::Other, "kernel returned no line handle"));
		}
		// now get fd managed to prevent resource leak
		let file = unsafe { fs::File::from_raw_fd(request.fd) };

		Ok(LineHandle {
			file,
			offset,
		})
	}

	pub fn offset(&self) -> u32 {
		self.offset
	}

	pub fn get(&self) -> io::Result<bool> {
		let mut data = HandleData::new();
		let res = unsafe { ioctl(self.file.as_raw_fd(), GPIOHANDLE_GET_LINE_VALUES_IOCTL as _, &mut data as *mut HandleData) };
		if -1 == res {
			return Err(io::Error::last_os_error());
		}
		Ok(0 != data.values[0])
	}

	pub fn set(&self, high: bool) -> io::Result<()> {
		let mut data = HandleData::new();
		data.values[0] = high as u8;
		let res = unsafe { ioctl(self.file.as_raw_fd(), GPIOHANDLE_SET_LINE_VALUES_IOCTL as _, &mut data as *mut HandleData) };
		if -1 == res {
			return Err(io::Error::last_os_error());
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags() {
		assert_eq!(request_flags(Direction::Input, Bias::PullDown), GPIOHANDLE_REQUEST_INPUT | GPIOHANDLE_REQUEST_BIAS_PULL_DOWN);
		assert_eq!(request_flags(Direction::Output, Bias::AsIs), GPIOHANDLE_REQUEST_OUTPUT);
		assert_eq!(request_flags(Direction::Input, Bias::Disabled), GPIOHANDLE_REQUEST_INPUT | GPIOHANDLE_REQUEST_BIAS_DISABLE);
	}

	#[test]
	fn missing_chip() {
		assert!(open_chip(Path::new("/nonexistent/gpiochip")).is_err());
	}
}
