//! Streaming text codecs.
//!
//! Loads run raw file bytes through a [`Codec`] which strips byte-order marks
//! and converts UTF-16 to UTF-8; stores run document bytes through the
//! matching [`Encoder`]. Both are stateful across the chunks of one job, so a
//! code unit or surrogate pair split by a chunk boundary is reassembled.

/// Text encoding detected on load and preserved on store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
	/// No byte-order mark; bytes pass through untouched.
	#[default]
	EightBit,
	/// UTF-8 with a byte-order mark.
	Utf8Bom,
	/// UTF-16 big endian with a byte-order mark.
	Utf16Be,
	/// UTF-16 little endian with a byte-order mark.
	Utf16Le,
	/// UTF-8 declared by a `coding: utf-8` cookie in the first two lines.
	Utf8Cookie,
}

impl Encoding {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::EightBit => "8-bit",
			Self::Utf8Bom => "utf-8-bom",
			Self::Utf16Be => "utf-16be",
			Self::Utf16Le => "utf-16le",
			Self::Utf8Cookie => "utf-8",
		}
	}

	/// Returns true for every encoding that is interpreted as Unicode.
	pub const fn is_unicode(self) -> bool {
		!matches!(self, Self::EightBit)
	}

	const fn bom(self) -> &'static [u8] {
		match self {
			Self::Utf8Bom => &[0xEF, 0xBB, 0xBF],
			Self::Utf16Be => &[0xFE, 0xFF],
			Self::Utf16Le => &[0xFF, 0xFE],
			Self::EightBit | Self::Utf8Cookie => &[],
		}
	}
}

/// Load-side streaming converter.
pub trait Codec: Send {
	/// Converts one chunk of file bytes, appending decoded bytes to `out`.
	fn decode(&mut self, chunk: &[u8], out: &mut Vec<u8>);

	/// Flushes anything held back waiting for more input.
	fn finish(&mut self, out: &mut Vec<u8>);

	/// Encoding detected so far.
	fn encoding(&self) -> Encoding;
}

/// Store-side streaming converter.
pub trait Encoder: Send {
	/// Converts one chunk of document bytes, appending file bytes to `out`.
	fn encode(&mut self, chunk: &[u8], out: &mut Vec<u8>);

	/// Emits trailing output; writes the byte-order mark of an empty document.
	fn finish(&mut self, out: &mut Vec<u8>);
}

/// Byte-order-mark sniffing [`Codec`].
#[derive(Debug, Default)]
pub struct BomCodec {
	detected: Option<Encoding>,
	head: Vec<u8>,
	odd: Option<u8>,
	high_surrogate: Option<u16>,
}

impl BomCodec {
	pub fn new() -> Self {
		Self::default()
	}

	fn detect(&mut self, out: &mut Vec<u8>) {
		let head = std::mem::take(&mut self.head);
		let (encoding, skip) = match head.as_slice() {
			[0xEF, 0xBB, 0xBF, ..] => (Encoding::Utf8Bom, 3),
			[0xFE, 0xFF, ..] => (Encoding::Utf16Be, 2),
			[0xFF, 0xFE, ..] => (Encoding::Utf16Le, 2),
			data if has_utf8_cookie(data) => (Encoding::Utf8Cookie, 0),
			_ => (Encoding::EightBit, 0),
		};
		self.detected = Some(encoding);
		self.convert(encoding, &head[skip..], out);
	}

	fn convert(&mut self, encoding: Encoding, data: &[u8], out: &mut Vec<u8>) {
		let big_endian = match encoding {
			Encoding::Utf16Be => true,
			Encoding::Utf16Le => false,
			_ => {
				out.extend_from_slice(data);
				return;
			}
		};

		let mut bytes = data.iter().copied();
		loop {
			let first = match self.odd.take() {
				Some(b) => b,
				None => match bytes.next() {
					Some(b) => b,
					None => break,
				},
			};
			let Some(second) = bytes.next() else {
				self.odd = Some(first);
				break;
			};
			let unit = if big_endian {
				u16::from_be_bytes([first, second])
			} else {
				u16::from_le_bytes([first, second])
			};
			self.push_unit(unit, out);
		}
	}

	fn push_unit(&mut self, unit: u16, out: &mut Vec<u8>) {
		if let Some(high) = self.high_surrogate.take() {
			if (0xDC00..=0xDFFF).contains(&unit) {
				let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
				push_char(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER), out);
				return;
			}
			push_char(char::REPLACEMENT_CHARACTER, out);
		}
		match unit {
			0xD800..=0xDBFF => self.high_surrogate = Some(unit),
			0xDC00..=0xDFFF => push_char(char::REPLACEMENT_CHARACTER, out),
			_ => push_char(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER), out),
		}
	}
}

impl Codec for BomCodec {
	fn decode(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
		match self.detected {
			Some(encoding) => self.convert(encoding, chunk, out),
			None => {
				self.head.extend_from_slice(chunk);
				if self.head.len() >= 3 {
					self.detect(out);
				}
			}
		}
	}

	fn finish(&mut self, out: &mut Vec<u8>) {
		if self.detected.is_none() {
			self.detect(out);
		}
		if self.odd.take().is_some() || self.high_surrogate.take().is_some() {
			push_char(char::REPLACEMENT_CHARACTER, out);
		}
	}

	fn encoding(&self) -> Encoding {
		self.detected.unwrap_or_default()
	}
}

/// [`Encoder`] writing the byte-order mark of its [`Encoding`].
#[derive(Debug)]
pub struct BomEncoder {
	encoding: Encoding,
	started: bool,
}

impl BomEncoder {
	pub fn new(encoding: Encoding) -> Self {
		Self { encoding, started: false }
	}

	fn start(&mut self, out: &mut Vec<u8>) {
		if !self.started {
			self.started = true;
			out.extend_from_slice(self.encoding.bom());
		}
	}
}

impl Encoder for BomEncoder {
	fn encode(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
		self.start(out);
		let big_endian = match self.encoding {
			Encoding::Utf16Be => true,
			Encoding::Utf16Le => false,
			_ => {
				out.extend_from_slice(chunk);
				return;
			}
		};
		for unit in String::from_utf8_lossy(chunk).encode_utf16() {
			let bytes = if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
			out.extend_from_slice(&bytes);
		}
	}

	fn finish(&mut self, out: &mut Vec<u8>) {
		self.start(out);
	}
}

/// End of the next chunk of `data` starting at `start`, at most `max` bytes
/// long and never splitting a UTF-8 sequence unless a single character is
/// longer than `max`.
pub fn chunk_end(data: &[u8], start: usize, max: usize) -> usize {
	let mut end = (start + max).min(data.len());
	if end == data.len() {
		return end;
	}
	let hard = end;
	while end > start && is_continuation(data[end]) {
		end -= 1;
	}
	if end == start { hard } else { end }
}

const fn is_continuation(b: u8) -> bool {
	b & 0xC0 == 0x80
}

fn push_char(c: char, out: &mut Vec<u8>) {
	let mut buf = [0u8; 4];
	out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Looks for `coding[:=] utf-8` in the first two lines.
fn has_utf8_cookie(data: &[u8]) -> bool {
	data.split(|&b| b == b'\n').take(2).any(|line| {
		line.windows(6).enumerate().any(|(i, w)| {
			if w != b"coding" {
				return false;
			}
			let rest = &line[i + 6..];
			let Some((&sep, rest)) = rest.split_first() else {
				return false;
			};
			if sep != b':' && sep != b'=' {
				return false;
			}
			let rest: Vec<u8> = rest.iter().copied().skip_while(|b| *b == b' ' || *b == b'\t').take(5).collect();
			rest.eq_ignore_ascii_case(b"utf-8")
		})
	})
}
