#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate gpio_vuart;
use gpio_vuart::*;

use std::io::{
	self,
	Write,
};
use std::process::exit;
use std::time::Duration;

use gpio_vuart::gpio::{
	LineId,
	LineMap,
};
use gpio_vuart::vuart::{
	Hardware,
	Receiver,
	ReceiverConfig,
	simulated::{
		Frame,
		SimulatedSender,
	},
};

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<Option<T>>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(None),
	};
	param.parse::<T>().map(Some).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn line_map(matches: &clap::ArgMatches) -> AResult<LineMap> {
	let default = LineMap::default();
	Ok(LineMap {
		notify: get_param::<LineId>(matches, "notify")?.unwrap_or(default.notify),
		enable: get_param::<LineId>(matches, "enable")?.unwrap_or(default.enable),
		data: get_param::<LineId>(matches, "data")?.unwrap_or(default.data),
		clock: get_param::<LineId>(matches, "clock")?.unwrap_or(default.clock),
	})
}

fn receiver_config(matches: &clap::ArgMatches) -> AResult<ReceiverConfig> {
	let stop = receive::install_stop_handler()?;
	let max_message_len = get_param::<usize>(matches, "max_length")?;
	if let Some(limit) = max_message_len {
		ensure!(limit > 0, "--max-length must be at least 1");
	}

	Ok(ReceiverConfig {
		poll_interval: get_param::<u64>(matches, "poll_interval")?.map(Duration::from_micros),
		notify_timeout: get_param::<u64>(matches, "notify_timeout")?.map(Duration::from_millis),
		bit_timeout: get_param::<u64>(matches, "bit_timeout")?.map(Duration::from_millis),
		max_message_len,
		stop: Some(stop),
	})
}

fn open_hardware(matches: &clap::ArgMatches) -> AResult<Box<dyn Hardware>> {
	if let Some(texts) = matches.values_of("simulate") {
		let frames: Vec<Frame> = texts.map(Frame::line).collect();
		info!("using simulated sender with {} message(s)", frames.len());
		return Ok(Box::new(SimulatedSender::new(frames)));
	}

	let chip = matches.value_of("chip").unwrap_or(gpio::DEFAULT_CHIP);
	let map = line_map(matches)?;
	Ok(Box::new(gpio::open_chip(chip, map)?))
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg chip: -c --chip +takes_value "GPIO character device [default: /dev/gpiochip0]")
		(@arg notify: --notify +takes_value "NOTIFY line offset [default: 1]")
		(@arg enable: --enable +takes_value "ENABLE line offset [default: 7]")
		(@arg data: --data +takes_value "DATA line offset [default: 25]")
		(@arg clock: --clock +takes_value "CLOCK line offset [default: 8]")
		(@arg poll_interval: --("poll-interval") +takes_value "pause between polls in microseconds [default: busy-wait]")
		(@arg bit_timeout: --("bit-timeout") +takes_value "give up a message if CLOCK doesn't change within this many milliseconds")
		(@arg notify_timeout: --("notify-timeout") +takes_value "wait at most this many milliseconds for NOTIFY before polling again")
		(@arg max_length: --("max-length") +takes_value "drop messages longer than this many bytes")
		(@arg count: -n --count +takes_value "stop after this many messages")
		(@arg hex: -x --hex "print messages as hex bytes")
		(@arg simulate: --simulate +takes_value +multiple "decode these messages from a simulated sender instead of GPIO lines")
	).get_matches();

	let hex = matches.is_present("hex");
	let count = get_param::<u64>(&matches, "count")?;
	let config = receiver_config(&matches)?;
	let mut receiver = Receiver::new(open_hardware(&matches)?, config)?;

	info!("Waiting for virtual UART data...");
	let summary = receive::run(&mut receiver, count, |message| {
		let stdout = io::stdout();
		let mut out = stdout.lock();
		if hex {
			writeln!(out, "Received: {}", message.to_hex())?;
		} else {
			writeln!(out, "Received: {}", message)?;
		}
		out.flush()?;
		Ok(())
	})?;

	info!(
		"Finished: {} message(s), {} timeout(s), {} over-long, {} not delivered",
		summary.messages, summary.timeouts, summary.protocol_violations, summary.consumer_errors
	);

	Ok(())
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
