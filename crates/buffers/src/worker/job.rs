//! Chunked load and store loops shared by inline and background I/O.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::codec::{Codec, Encoder, Encoding, chunk_end};
use super::{WorkerProgress, WorkerId};

/// Why a load stopped before reaching end of file.
#[derive(Debug)]
pub enum LoadStop {
	Cancelled,
	Io(io::Error),
}

/// Everything a background loader needs; built on the main context.
pub struct LoadRequest {
	pub id: WorkerId,
	pub path: PathBuf,
	pub file: File,
	pub expected: u64,
	pub codec: Box<dyn Codec>,
	pub chunk_size: usize,
	pub sleep: Duration,
}

/// Everything a background storer needs; built on the main context.
pub struct StoreRequest {
	pub id: WorkerId,
	pub path: PathBuf,
	pub file: File,
	/// Document bytes captured when the save was requested.
	pub snapshot: Bytes,
	pub encoder: Box<dyn Encoder>,
	pub chunk_size: usize,
	pub sleep: Duration,
}

/// Reads `reader` to the end in `chunk_size` pieces, handing decoded text to `sink`.
///
/// Progress is published and cancellation polled only between chunks.
pub fn pump_load<R: Read>(
	reader: &mut R,
	codec: &mut dyn Codec,
	chunk_size: usize,
	progress: Option<&WorkerProgress>,
	cancel: Option<&CancellationToken>,
	sleep: Duration,
	mut sink: impl FnMut(&[u8]),
) -> Result<Encoding, LoadStop> {
	let mut raw = vec![0u8; chunk_size.max(1)];
	let mut decoded = Vec::with_capacity(raw.len());
	loop {
		let n = match reader.read(&mut raw) {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(LoadStop::Io(e)),
		};
		decoded.clear();
		codec.decode(&raw[..n], &mut decoded);
		sink(&decoded);
		if let Some(progress) = progress {
			progress.advance(n as u64);
		}
		if cancel.is_some_and(CancellationToken::is_cancelled) {
			return Err(LoadStop::Cancelled);
		}
		if !sleep.is_zero() {
			std::thread::sleep(sleep);
		}
	}
	decoded.clear();
	codec.finish(&mut decoded);
	sink(&decoded);
	Ok(codec.encoding())
}

/// Encodes and writes `data` in `chunk_size` pieces cut at character boundaries.
pub fn pump_store<W: Write>(
	writer: &mut W,
	data: &[u8],
	encoder: &mut dyn Encoder,
	chunk_size: usize,
	progress: Option<&WorkerProgress>,
	sleep: Duration,
) -> io::Result<()> {
	let mut encoded = Vec::with_capacity(chunk_size);
	let mut start = 0;
	while start < data.len() {
		let end = chunk_end(data, start, chunk_size.max(1));
		encoded.clear();
		encoder.encode(&data[start..end], &mut encoded);
		writer.write_all(&encoded)?;
		if let Some(progress) = progress {
			progress.advance((end - start) as u64);
		}
		start = end;
		if !sleep.is_zero() && start < data.len() {
			std::thread::sleep(sleep);
		}
	}
	encoded.clear();
	encoder.finish(&mut encoded);
	writer.write_all(&encoded)?;
	writer.flush()
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;
	use crate::worker::codec::{BomCodec, BomEncoder};

	#[test]
	fn load_reports_progress_per_chunk() {
		let data = vec![b'x'; 10];
		let progress = WorkerProgress::new(10);
		let mut seen = Vec::new();
		let mut text = Vec::new();
		let enc = pump_load(
			&mut Cursor::new(&data),
			&mut BomCodec::new(),
			4,
			Some(&progress),
			None,
			Duration::ZERO,
			|bytes| {
				text.extend_from_slice(bytes);
				seen.push(progress.done());
			},
		)
		.unwrap();
		assert_eq!(enc, Encoding::EightBit);
		assert_eq!(text, data);
		assert_eq!(progress.done(), 10);
		assert!(seen.windows(2).all(|w| w[0] <= w[1]));
	}

	#[test]
	fn load_stops_at_chunk_boundary_when_cancelled() {
		let data = vec![b'y'; 64];
		let cancel = CancellationToken::new();
		cancel.cancel();
		let progress = WorkerProgress::new(64);
		let stop = pump_load(
			&mut Cursor::new(&data),
			&mut BomCodec::new(),
			16,
			Some(&progress),
			Some(&cancel),
			Duration::ZERO,
			|_| {},
		)
		.unwrap_err();
		assert!(matches!(stop, LoadStop::Cancelled));
		assert_eq!(progress.done(), 16);
	}

	#[test]
	fn store_writes_everything_with_bom() {
		let mut out = Vec::new();
		let progress = WorkerProgress::new(5);
		pump_store(&mut out, b"hello", &mut BomEncoder::new(Encoding::Utf8Bom), 2, Some(&progress), Duration::ZERO).unwrap();
		assert_eq!(out, b"\xEF\xBB\xBFhello");
		assert_eq!(progress.done(), 5);
	}
}
