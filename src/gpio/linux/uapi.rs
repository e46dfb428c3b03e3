// Linux GPIO character device ABI (v1 line handles), see <linux/gpio.h>
#![allow(dead_code)]
use std::mem;

use libc::c_int;

pub const GPIOHANDLES_MAX: usize = 64;

pub const GPIOHANDLE_REQUEST_INPUT:        u32 = 1 << 0;
pub const GPIOHANDLE_REQUEST_OUTPUT:       u32 = 1 << 1;
pub const GPIOHANDLE_REQUEST_ACTIVE_LOW:   u32 = 1 << 2;
pub const GPIOHANDLE_REQUEST_OPEN_DRAIN:   u32 = 1 << 3;
pub const GPIOHANDLE_REQUEST_OPEN_SOURCE:  u32 = 1 << 4;
pub const GPIOHANDLE_REQUEST_BIAS_PULL_UP:   u32 = 1 << 5;
pub const GPIOHANDLE_REQUEST_BIAS_PULL_DOWN: u32 = 1 << 6;
pub const GPIOHANDLE_REQUEST_BIAS_DISABLE:   u32 = 1 << 7;

#[repr(C)]
pub struct HandleRequest {
	pub lineoffsets: [u32; GPIOHANDLES_MAX],
	pub flags: u32,
	pub default_values: [u8; GPIOHANDLES_MAX],
	pub consumer_label: [u8; 32],
	pub lines: u32,
	pub fd: c_int,
}

impl HandleRequest {
	pub fn single(offset: u32, flags: u32, default_value: bool, consumer: &str) -> Self {
		let mut request = HandleRequest {
			lineoffsets: [0; GPIOHANDLES_MAX],
			flags,
			default_values: [0; GPIOHANDLES_MAX],
			consumer_label: [0; 32],
			lines: 1,
			fd: -1,
		};
		request.lineoffsets[0] = offset;
		request.default_values[0] = default_value as u8;
		// keep the terminating NUL
		let label = consumer.as_bytes();
		let len = label.len().min(request.consumer_label.len() - 1);
		request.consumer_label[..len].copy_from_slice(&label[..len]);
		request
	}
}

#[repr(C)]
pub struct HandleData {
	pub values: [u8; GPIOHANDLES_MAX],
}

impl HandleData {
	pub fn new() -> Self {
		HandleData {
			values: [0; GPIOHANDLES_MAX],
		}
	}
}

const GPIO_IOCTL_MAGIC: u32 = 0xb4;

// _IOWR(GPIO_IOCTL_MAGIC, nr, size)
const fn iowr(nr: u32, size: usize) -> u32 {
	(3 << 30) | ((size as u32) << 16) | (GPIO_IOCTL_MAGIC << 8) | nr
}

pub const GPIO_GET_LINEHANDLE_IOCTL: u32 = iowr(0x03, mem::size_of::<HandleRequest>());
pub const GPIOHANDLE_GET_LINE_VALUES_IOCTL: u32 = iowr(0x08, mem::size_of::<HandleData>());
pub const GPIOHANDLE_SET_LINE_VALUES_IOCTL: u32 = iowr(0x09, mem::size_of::<HandleData>());

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ioctl_numbers() {
		assert_eq!(mem::size_of::<HandleRequest>(), 364);
		assert_eq!(GPIO_GET_LINEHANDLE_IOCTL, 0xc16c_b403);
		assert_eq!(GPIOHANDLE_GET_LINE_VALUES_IOCTL, 0xc040_b408);
		assert_eq!(GPIOHANDLE_SET_LINE_VALUES_IOCTL, 0xc040_b409);
	}

	#[test]
	fn label_is_truncated() {
		let request = HandleRequest::single(7, GPIOHANDLE_REQUEST_OUTPUT, false, &"x".repeat(40));
		assert_eq!(request.consumer_label[30], b'x');
		assert_eq!(request.consumer_label[31], 0);
		assert_eq!(request.lineoffsets[0], 7);
		assert_eq!(request.lines, 1);
	}
}
